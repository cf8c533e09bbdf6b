use crate::models::{ListingRow, COLUMNS};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Output file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Serialize)]
struct JsonExport<'a> {
    scraped_at: DateTime<Utc>,
    source: &'a str,
    count: usize,
    listings: &'a [ListingRow],
}

/// CSV with a header row, even when there are no listings
pub fn to_csv(rows: &[ListingRow]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(COLUMNS)?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("Failed to serialize listing {}", row.url))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV buffer: {}", e.error()))
}

pub fn to_json(rows: &[ListingRow], source: &str) -> Result<Vec<u8>> {
    let export = JsonExport {
        scraped_at: Utc::now(),
        source,
        count: rows.len(),
        listings: rows,
    };
    Ok(serde_json::to_vec_pretty(&export)?)
}

/// Write listings to `path`, creating parent directories as needed
pub async fn write_listings(
    path: &Path,
    rows: &[ListingRow],
    format: OutputFormat,
    source: &str,
) -> Result<()> {
    let bytes = match format {
        OutputFormat::Csv => to_csv(rows)?,
        OutputFormat::Json => to_json(rows, source)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
