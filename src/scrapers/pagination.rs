use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static LINK_NEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel='next'][href]").expect("invalid selector: link next"));

static ANCHOR_NEXT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[rel='next'][href], a.next[href]").expect("invalid selector: anchor next")
});

static PAGE_ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href*='page']:not(.active)").expect("invalid selector: page anchor")
});

static RE_PAGE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/page-(\d+)").expect("invalid regex: page segment"));

/// Page number encoded in a URL, 1 when there is none
fn page_number(url: &str) -> u32 {
    RE_PAGE_SEGMENT
        .captures(url)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(1)
}

fn head_link(document: &Html, current: &Url) -> Option<Url> {
    let href = document.select(&LINK_NEXT).next()?.value().attr("href")?;
    current.join(href.trim()).ok()
}

fn pagination_anchor(document: &Html, current: &Url) -> Option<Url> {
    if let Some(url) = document
        .select(&ANCHOR_NEXT)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| current.join(href.trim()).ok())
    {
        return Some(url);
    }

    // Numbered links: only move forward, never back to an earlier page
    let here = page_number(current.as_str());
    document
        .select(&PAGE_ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| current.join(href.trim()).ok())
        .find(|url| page_number(url.as_str()) > here)
}

/// Increment `/page-N`, or append `/page-2` when the URL has no page segment.
/// Every `/page-N` segment is rewritten to the number after the first one.
/// `None` when the page number cannot be incremented.
pub fn increment_page(current: &Url) -> Option<Url> {
    let s = current.as_str();
    let next = match RE_PAGE_SEGMENT.captures(s) {
        Some(caps) => {
            let n: u32 = caps[1].parse().ok()?;
            let following = n.checked_add(1)?;
            RE_PAGE_SEGMENT
                .replace_all(s, format!("/page-{}", following).as_str())
                .into_owned()
        }
        None => format!("{}/page-2", s.trim_end_matches('/')),
    };
    Url::parse(&next).ok()
}

/// Next page reference for a district walk.
///
/// A page without rows ends the walk. Otherwise an explicit `<link rel="next">`
/// wins, then a pagination anchor, then sequential page numbering.
pub fn next_page(document: &Html, current: &Url, rows_found: usize) -> Option<Url> {
    if rows_found == 0 {
        return None;
    }
    head_link(document, current)
        .or_else(|| pagination_anchor(document, current))
        .or_else(|| increment_page(current))
}
