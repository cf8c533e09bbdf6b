mod models;
mod output;
mod scrapers;

use anyhow::Result;
use clap::Parser;
use output::OutputFormat;
use scrapers::types::{DelayRange, ScrapeConfig, DEFAULT_BASE_URL};
use scrapers::{HttpFetcher, SquarefootScraper};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Scrape squarefoot.com.hk sale listings into a flat file
#[derive(Debug, Parser)]
#[command(name = "squarefoot-scout", version, about)]
struct Cli {
    /// Output file path
    #[arg(short, long, default_value = "squarefoot_listings.csv")]
    output: PathBuf,

    /// Use the fixed district codes instead of crawling the navigation
    #[arg(long)]
    no_discover: bool,

    /// Maximum pages per district
    #[arg(long, default_value_t = 5)]
    max_pages: usize,

    /// Also walk discovered sub-district paths
    #[arg(long)]
    sub_districts: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Lower bound of the pause before each request
    #[arg(long, default_value_t = 1000)]
    min_delay_ms: u64,

    /// Upper bound of the pause before each request
    #[arg(long, default_value_t = 2000)]
    max_delay_ms: u64,

    /// Per-request timeout
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long, env = "SQUAREFOOT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

impl Cli {
    fn scrape_config(&self) -> Result<ScrapeConfig> {
        let config = ScrapeConfig {
            delay: DelayRange::new(
                Duration::from_millis(self.min_delay_ms),
                Duration::from_millis(self.max_delay_ms),
            )?,
            timeout: Duration::from_secs(self.timeout_secs),
            max_pages: self.max_pages,
            discover: !self.no_discover,
            include_sub_districts: self.sub_districts,
            ..ScrapeConfig::with_base_url(&self.base_url)?
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.scrape_config()?;

    info!("🏠 Squarefoot Scout");
    info!(
        base_url = %config.base_url,
        max_pages = config.max_pages,
        discover = config.discover,
        "Starting listing scrape"
    );

    let fetcher = HttpFetcher::new(config.clone())?;
    let scraper = SquarefootScraper::new(fetcher, config)?;
    let outcome = scraper.run().await?;

    for report in &outcome.reports {
        info!(
            "{} ({}): {} listings over {} pages, {}",
            report.label, report.code, report.rows, report.pages, report.stop
        );
    }

    output::write_listings(&cli.output, &outcome.rows, cli.format, "squarefoot").await?;
    info!("💾 Saved {} rows to {}", outcome.rows.len(), cli.output.display());

    Ok(())
}
