use crate::scrapers::cards::CardStrategy;
use serde::Serialize;
use url::Url;

/// Column order of the output file
pub const COLUMNS: [&str; 10] = [
    "url",
    "district",
    "address",
    "building_name",
    "price_hkd",
    "size_sqft",
    "price_per_sqft",
    "rooms",
    "floor",
    "listed_date",
];

/// Area codes used when discovery is disabled or finds nothing
pub const DEFAULT_DISTRICT_CODES: [&str; 4] = ["a1", "a2", "a3", "a170"];

/// One listing card, flattened for the output file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingRow {
    pub url: String,
    pub district: String,
    pub address: String,
    pub building_name: String,
    #[serde(rename = "price_hkd")]
    pub price: Option<u64>,
    #[serde(rename = "size_sqft")]
    pub size: Option<u64>,
    #[serde(rename = "price_per_sqft")]
    pub price_per_unit: Option<u64>,
    pub rooms: Option<u32>,
    pub floor: Option<String>,
    pub listed_date: String,
}

impl ListingRow {
    /// Uniqueness key within one district walk
    pub fn district_key(&self) -> (String, String, Option<u64>) {
        (self.url.clone(), self.building_name.clone(), self.price)
    }

    /// Uniqueness key across all districts
    pub fn global_key(&self) -> (String, Option<u64>, Option<u64>) {
        (self.address.clone(), self.price, self.size)
    }

    /// Gallery wrappers get picked up as cards and carry "Image" as their first line
    pub fn is_image_artifact(&self) -> bool {
        self.building_name.trim().starts_with("Image")
    }
}

/// Site-specific district identifier, e.g. "a1" or "a1/dg12"
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DistrictCode(String);

impl DistrictCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading area segment ("a1" for "a1/dg12")
    pub fn area(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    /// Human label for the area; unknown codes pass through unchanged
    pub fn label(&self) -> String {
        match self.area() {
            "a1" => "Hong Kong Island".to_string(),
            "a2" => "Kowloon".to_string(),
            "a3" => "New Territories".to_string(),
            "a170" => "Outlying Islands".to_string(),
            other => other.to_string(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        DEFAULT_DISTRICT_CODES.iter().map(|c| Self::new(*c)).collect()
    }
}

impl std::fmt::Display for DistrictCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rows parsed from one fetched page and where to go next
#[derive(Debug, Clone)]
pub struct PageResult {
    pub url: Url,
    pub rows: Vec<ListingRow>,
    pub cards_found: usize,
    /// Locator strategy that found the cards, `None` when nothing was found
    pub strategy: Option<CardStrategy>,
    pub next: Option<Url>,
}

/// Why a district walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Page had rows but no pagination signal
    NoNextPage,
    /// Page produced no rows; `cards_found > 0` means cards were located but none parsed
    EmptyPage { cards_found: usize },
    /// Configured page limit reached
    PageCap,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::NoNextPage => f.write_str("no next page"),
            StopReason::EmptyPage { cards_found: 0 } => f.write_str("no listing cards on page"),
            StopReason::EmptyPage { cards_found } => {
                write!(f, "{} cards found but none parsed", cards_found)
            }
            StopReason::PageCap => f.write_str("page limit reached"),
        }
    }
}

/// Summary of one district walk
#[derive(Debug, Clone)]
pub struct DistrictReport {
    pub code: DistrictCode,
    pub label: String,
    pub pages: usize,
    pub rows: usize,
    pub stop: StopReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_labels() {
        assert_eq!(DistrictCode::new("a2").label(), "Kowloon");
        assert_eq!(DistrictCode::new("a170").label(), "Outlying Islands");
    }

    #[test]
    fn unknown_code_passes_through() {
        assert_eq!(DistrictCode::new("a99").label(), "a99");
    }

    #[test]
    fn sub_district_uses_area_label() {
        let code = DistrictCode::new("a1/dg12");
        assert_eq!(code.area(), "a1");
        assert_eq!(code.label(), "Hong Kong Island");
    }

    #[test]
    fn image_rows_are_artifacts() {
        let row = ListingRow {
            building_name: "  Image 3 of 12".to_string(),
            ..Default::default()
        };
        assert!(row.is_image_artifact());
    }

    #[test]
    fn stop_reason_tells_parse_failure_apart() {
        assert_eq!(
            StopReason::EmptyPage { cards_found: 0 }.to_string(),
            "no listing cards on page"
        );
        assert_eq!(
            StopReason::EmptyPage { cards_found: 4 }.to_string(),
            "4 cards found but none parsed"
        );
    }
}
