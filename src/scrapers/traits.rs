use anyhow::Result;
use async_trait::async_trait;
use url::Url;

/// Body of a fetched page together with the URL it was served from
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,
    pub body: String,
}

/// Where pages come from
/// The orchestrator only talks to this, so tests can serve fixtures instead of the network
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page; failures abort the run
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;

    /// Get the name of the page source
    fn source_name(&self) -> &'static str;
}
