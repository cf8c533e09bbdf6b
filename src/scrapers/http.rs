use crate::scrapers::traits::{FetchedPage, PageFetcher};
use crate::scrapers::types::ScrapeConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

/// Network failures; none of them are retried
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{url} returned status {status}")]
    Status { url: Url, status: StatusCode },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetches pages over HTTP, pausing a random interval before every request
pub struct HttpFetcher {
    client: Client,
    config: ScrapeConfig,
}

impl HttpFetcher {
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .context("Invalid Accept-Language header")?,
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        let pause = self.config.delay.sample();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Listing site returned an error status");
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            }
            .into());
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        debug!("Downloaded {} bytes of HTML from {}", body.len(), final_url);

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }

    fn source_name(&self) -> &'static str {
        "squarefoot"
    }
}
