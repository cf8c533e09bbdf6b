use anyhow::{bail, Context, Result};
use rand::Rng;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.squarefoot.com.hk";
pub const BUY_PATH: &str = "/en/buy/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Bounds for the randomized pause before each request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            bail!("Minimum delay {:?} exceeds maximum delay {:?}", min, max);
        }
        Ok(Self { min, max })
    }

    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Pick a duration uniformly within the bounds
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(1000),
            max: Duration::from_millis(2000),
        }
    }
}

/// Scrape settings passed explicitly to the fetcher and the orchestrator
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Site root, used to resolve relative links
    pub base_url: Url,
    pub delay: DelayRange,
    pub timeout: Duration,
    pub user_agent: String,
    pub accept_language: String,
    /// Maximum pages walked per district
    pub max_pages: usize,
    /// Crawl the navigation for district codes instead of using the fixed list
    pub discover: bool,
    /// Also walk discovered sub-district paths ("a1/dg12")
    pub include_sub_districts: bool,
}

impl ScrapeConfig {
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid base URL: {}", base_url))?;
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    /// Landing page of the buy section; district paths resolve against it
    pub fn buy_url(&self) -> Result<Url> {
        self.base_url
            .join(BUY_PATH)
            .context("Failed to build buy section URL")
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            bail!("max_pages must be at least 1");
        }
        if self.timeout.is_zero() {
            bail!("Request timeout must be greater than zero");
        }
        if self.delay.min > self.delay.max {
            bail!("Delay bounds are inverted");
        }
        Ok(())
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            delay: DelayRange::default(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-HK,en;q=0.9".to_string(),
            max_pages: 5,
            discover: true,
            include_sub_districts: false,
        }
    }
}
