use crate::models::DistrictCode;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

static NAV_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.item[href]").expect("invalid selector: nav item"));

static RE_AREA_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^a\d+$").expect("invalid regex: area code"));

/// District codes found in the buy page navigation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveredCodes {
    /// Area codes, sorted, never empty after `discover_codes`
    pub areas: Vec<DistrictCode>,
    /// Area plus `dg` segment paths, in navigation order
    pub sub_districts: Vec<DistrictCode>,
}

/// Collect area and sub-district codes from `a.item` navigation links.
/// Falls back to the fixed code list when no area code is found.
pub fn discover_codes(document: &Html, base: &Url) -> DiscoveredCodes {
    let mut areas = BTreeSet::new();
    let mut sub_districts = Vec::new();

    for anchor in document.select(&NAV_ITEM) {
        let href = anchor.value().attr("href").unwrap_or("").trim();
        let Ok(full) = base.join(href) else {
            continue;
        };
        if !full.as_str().contains("/en/buy/") {
            continue;
        }

        let parts: Vec<&str> = full
            .path()
            .split('/')
            .filter(|p| !p.is_empty() && *p != "en" && *p != "buy")
            .collect();
        let Some(first) = parts.first() else {
            continue;
        };

        if RE_AREA_CODE.is_match(first) {
            areas.insert(first.to_string());
        }
        if let Some(second) = parts.get(1) {
            if second.starts_with("dg") {
                let path = DistrictCode::new(format!("{}/{}", first, second));
                if !sub_districts.contains(&path) {
                    sub_districts.push(path);
                }
            }
        }
    }

    let areas = if areas.is_empty() {
        DistrictCode::defaults()
    } else {
        areas.into_iter().map(DistrictCode::new).collect()
    };

    DiscoveredCodes {
        areas,
        sub_districts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.squarefoot.com.hk").unwrap()
    }

    #[test]
    fn collects_areas_and_sub_districts() {
        let doc = Html::parse_document(
            r#"<nav>
                 <a class="item" href="/en/buy/a2/">Kowloon</a>
                 <a class="item" href="/en/buy/a1/">HK Island</a>
                 <a class="item" href="/en/buy/a1/dg12">Central</a>
                 <a class="item" href="/en/buy/a1/dg12">Central again</a>
                 <a class="item" href="/en/rent/a3/">Rent</a>
                 <a class="item" href="/en/buy/">All</a>
                 <a href="/en/buy/a9/">Not a nav item</a>
               </nav>"#,
        );
        let codes = discover_codes(&doc, &base());
        assert_eq!(codes.areas, vec![DistrictCode::new("a1"), DistrictCode::new("a2")]);
        assert_eq!(codes.sub_districts, vec![DistrictCode::new("a1/dg12")]);
    }

    #[test]
    fn areas_sort_as_strings() {
        let doc = Html::parse_document(
            r#"<a class="item" href="/en/buy/a3">x</a>
               <a class="item" href="/en/buy/a170">y</a>
               <a class="item" href="/en/buy/a1">z</a>"#,
        );
        let codes = discover_codes(&doc, &base());
        let names: Vec<&str> = codes.areas.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["a1", "a170", "a3"]);
    }

    #[test]
    fn empty_navigation_uses_fixed_list() {
        let doc = Html::parse_document("<body></body>");
        let codes = discover_codes(&doc, &base());
        assert_eq!(codes.areas, DistrictCode::defaults());
        assert!(codes.sub_districts.is_empty());
    }
}
