use crate::models::ListingRow;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::debug;

static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("invalid selector: ld+json")
});

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemList {
    #[serde(default)]
    item_list_element: Vec<ListElement>,
}

#[derive(Debug, Deserialize)]
struct ListElement {
    url: Option<String>,
}

/// Listing URLs from the page's first JSON-LD block, in page order
pub fn listing_urls(document: &Html) -> Vec<String> {
    let Some(script) = document.select(&LD_JSON).next() else {
        return Vec::new();
    };
    let raw = script.text().collect::<String>();

    match serde_json::from_str::<ItemList>(&raw) {
        Ok(list) => list
            .item_list_element
            .into_iter()
            .filter_map(|e| e.url)
            .filter(|u| u.contains("property"))
            .collect(),
        Err(e) => {
            debug!(error = %e, "Ignoring unparseable JSON-LD block");
            Vec::new()
        }
    }
}

/// Fill rows that have no URL with the JSON-LD URL at the same position
pub fn backfill_urls(rows: &mut [ListingRow], urls: &[String]) {
    for (row, url) in rows.iter_mut().zip(urls) {
        if row.url.is_empty() {
            row.url = url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ld: &str) -> Html {
        Html::parse_document(&format!(
            r#"<html><head><script type="application/ld+json">{}</script></head><body></body></html>"#,
            ld
        ))
    }

    #[test]
    fn reads_property_urls() {
        let doc = page(
            r#"{"@type":"ItemList","itemListElement":[
                {"position":1,"url":"https://www.squarefoot.com.hk/en/buy/property-1"},
                {"position":2},
                {"position":3,"url":"https://www.squarefoot.com.hk/en/news/1"},
                {"position":4,"url":"https://www.squarefoot.com.hk/en/buy/property-4"}
            ]}"#,
        );
        assert_eq!(
            listing_urls(&doc),
            vec![
                "https://www.squarefoot.com.hk/en/buy/property-1".to_string(),
                "https://www.squarefoot.com.hk/en/buy/property-4".to_string(),
            ]
        );
    }

    #[test]
    fn broken_json_is_ignored() {
        let doc = page("{ not json");
        assert!(listing_urls(&doc).is_empty());
    }

    #[test]
    fn backfill_only_touches_missing_urls() {
        let mut rows = vec![
            ListingRow {
                url: "https://a/property-9".to_string(),
                ..Default::default()
            },
            ListingRow::default(),
            ListingRow::default(),
        ];
        let urls = vec!["u1".to_string(), "u2".to_string()];
        backfill_urls(&mut rows, &urls);
        assert_eq!(rows[0].url, "https://a/property-9");
        assert_eq!(rows[1].url, "u2");
        assert_eq!(rows[2].url, "");
    }
}
