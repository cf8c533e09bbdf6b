use crate::models::{DistrictCode, DistrictReport, ListingRow, PageResult, StopReason};
use crate::scrapers::cards::locate_cards;
use crate::scrapers::discovery::{discover_codes, DiscoveredCodes};
use crate::scrapers::extract::parse_card;
use crate::scrapers::jsonld;
use crate::scrapers::pagination::next_page;
use crate::scrapers::traits::{FetchedPage, PageFetcher};
use crate::scrapers::types::ScrapeConfig;
use anyhow::{Context, Result};
use scraper::Html;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// Everything a run produced
#[derive(Debug, Clone, Default)]
pub struct ScrapeOutcome {
    pub rows: Vec<ListingRow>,
    pub reports: Vec<DistrictReport>,
}

/// Walks squarefoot.com.hk district by district
pub struct SquarefootScraper<F: PageFetcher> {
    fetcher: F,
    config: ScrapeConfig,
}

impl<F: PageFetcher> SquarefootScraper<F> {
    pub fn new(fetcher: F, config: ScrapeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { fetcher, config })
    }

    /// Resolve "a1", "a1/dg12" or an absolute URL to a page URL
    pub fn resolve(&self, path_or_url: &str) -> Result<Url> {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            return Url::parse(path_or_url)
                .with_context(|| format!("Invalid page URL: {}", path_or_url));
        }
        let buy = self.config.buy_url()?;
        let trimmed = path_or_url.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(buy);
        }
        buy.join(&format!("{}/", trimmed))
            .with_context(|| format!("Invalid district path: {}", path_or_url))
    }

    /// Read district codes off the buy landing page
    pub async fn discover(&self) -> Result<DiscoveredCodes> {
        let url = self.config.buy_url()?;
        let page = self
            .fetcher
            .fetch(&url)
            .await
            .context("Failed to fetch buy landing page")?;
        let document = Html::parse_document(&page.body);
        Ok(discover_codes(&document, &self.config.base_url))
    }

    /// Fetch one listing page and parse its cards
    pub async fn scrape_page(&self, url: &Url, district: &str) -> Result<PageResult> {
        let page = self
            .fetcher
            .fetch(url)
            .await
            .with_context(|| format!("Failed to fetch listing page {}", url))?;
        Ok(parse_page(&page, &self.config.base_url, district))
    }

    /// Walk one district's pages until the results run out or the page cap is hit
    pub async fn scrape_district(
        &self,
        code: &DistrictCode,
    ) -> Result<(Vec<ListingRow>, DistrictReport)> {
        let label = code.label();
        let mut target = self.resolve(code.as_str())?;
        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        let mut pages = 0;
        let mut stop = StopReason::PageCap;

        while pages < self.config.max_pages {
            let result = self.scrape_page(&target, &label).await?;
            pages += 1;

            let found = result.rows.len();
            let before = rows.len();
            for row in result.rows {
                if seen.insert(row.district_key()) {
                    rows.push(row);
                }
            }
            debug!(
                district = %code,
                page = pages,
                found,
                new = rows.len() - before,
                strategy = ?result.strategy,
                url = %result.url,
                "Parsed listing page"
            );

            if found == 0 {
                stop = StopReason::EmptyPage {
                    cards_found: result.cards_found,
                };
                if result.cards_found > 0 {
                    warn!(district = %code, page = pages, cards = result.cards_found, "Cards located but none parsed");
                }
                break;
            }
            match result.next {
                Some(next) => target = next,
                None => {
                    stop = StopReason::NoNextPage;
                    break;
                }
            }
        }

        let report = DistrictReport {
            code: code.clone(),
            label,
            pages,
            rows: rows.len(),
            stop,
        };
        Ok((rows, report))
    }

    /// Districts to walk for this run
    pub async fn targets(&self) -> Result<Vec<DistrictCode>> {
        if !self.config.discover {
            return Ok(DistrictCode::defaults());
        }

        info!("Discovering district codes from the buy page...");
        let codes = self.discover().await?;
        info!(
            areas = ?codes.areas.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            sub_districts = codes.sub_districts.len(),
            "Discovered district codes"
        );

        let mut targets = codes.areas;
        if self.config.include_sub_districts {
            targets.extend(codes.sub_districts);
        }
        Ok(targets)
    }

    /// Scrape every district and return deduplicated rows
    pub async fn run(&self) -> Result<ScrapeOutcome> {
        info!("Starting {} scrape", self.fetcher.source_name());

        let mut all_rows = Vec::new();
        let mut reports = Vec::new();

        for code in self.targets().await? {
            info!("Scraping district {} ({})...", code, code.label());
            let (rows, report) = self.scrape_district(&code).await?;
            all_rows.extend(rows);
            info!(
                district = %code,
                pages = report.pages,
                total = all_rows.len(),
                "Got {} listings, stopped: {}",
                report.rows,
                report.stop
            );
            reports.push(report);
        }

        let rows = dedupe_listings(all_rows);
        info!("✅ {} unique listings after cleanup", rows.len());

        Ok(ScrapeOutcome { rows, reports })
    }
}

/// Parse a fetched listing page into rows and the next page reference
pub fn parse_page(page: &FetchedPage, base: &Url, district: &str) -> PageResult {
    let document = Html::parse_document(&page.body);
    let (strategy, cards) = locate_cards(&document);

    let mut rows: Vec<ListingRow> = cards
        .iter()
        .filter_map(|card| parse_card(*card, base, district))
        .collect();

    jsonld::backfill_urls(&mut rows, &jsonld::listing_urls(&document));

    let next = next_page(&document, &page.url, rows.len());

    PageResult {
        url: page.url.clone(),
        rows,
        cards_found: cards.len(),
        strategy,
        next,
    }
}

/// Drop gallery artifacts and collapse rows sharing address, price and size
pub fn dedupe_listings(rows: Vec<ListingRow>) -> Vec<ListingRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| !row.is_image_artifact())
        .filter(|row| seen.insert(row.global_key()))
        .collect()
}
