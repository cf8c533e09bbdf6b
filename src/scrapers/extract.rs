//! Field extraction for a single listing card.
//!
//! Every field is resolved by an ordered list of named rules; the first rule
//! that matches wins. Cards come in English and Chinese variants, so most
//! fields carry one rule per language.

use crate::models::ListingRow;
use regex::{Captures, Regex};
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use tracing::trace;
use url::Url;

static RE_PRICE_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Sell\s+HKD\s*\$?\s*(\d[\d.,]*)\s*Millions?\s*(?:@\s*(\d[\d.,]*))?")
        .expect("invalid regex: english price")
});

static RE_PRICE_ZH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"售\s*\$?\s*(\d[\d,]*)\s*萬元\s*(?:@\s*(\d[\d,]*)\s*元)?")
        .expect("invalid regex: chinese price")
});

static RE_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\s*(?:ft²|sq\s*ft|ft\s*²|呎)").expect("invalid regex: size")
});

static RE_ROOMS_AFTER_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:ft²|呎)\s*(\d+)").expect("invalid regex: rooms after unit")
});

static RE_ROOMS_FACING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)(\d+)\s*(?:\d+\s*)?(?:\b(?:(?:north|south)(?:[- ]?(?:east|west))?|east|west)[ \t]*$|[東南西北]*向)",
    )
    .expect("invalid regex: rooms before facing")
});

static RE_FLOOR_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Floor\s*,?\s*(\d+)|(\d+)\s*F\b").expect("invalid regex: numeric floor")
});

static RE_FLOOR_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(High|Mid|Low|Ground)\s+Floor").expect("invalid regex: floor level")
});

static RE_NUMERIC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s,.$@]+$").expect("invalid regex: numeric line"));

static RE_IMAGE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|webp)(\?|$)").expect("invalid regex: image link")
});

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector: anchor"));

/// A named matcher for one field
pub struct Rule<T> {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<T>,
}

/// Run rules in order and return the first hit with the rule's name
pub fn first_match<T>(rules: &[Rule<T>], text: &str) -> Option<(&'static str, T)> {
    rules
        .iter()
        .find_map(|rule| (rule.apply)(text).map(|value| (rule.name, value)))
}

/// Asking price, with the per-unit figure when the card states one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub total: u64,
    pub per_unit: Option<u64>,
}

pub static PRICE_RULES: &[Rule<PriceQuote>] = &[
    Rule {
        name: "english_millions",
        apply: english_price,
    },
    Rule {
        name: "chinese_wan",
        apply: chinese_price,
    },
];

pub static SIZE_RULES: &[Rule<u64>] = &[Rule {
    name: "area_unit",
    apply: size_with_unit,
}];

pub static ROOM_RULES: &[Rule<u32>] = &[
    Rule {
        name: "after_area_unit",
        apply: rooms_after_unit,
    },
    Rule {
        name: "before_facing",
        apply: rooms_before_facing,
    },
];

// A literal floor number overrides the High/Mid/Low phrase when both appear.
pub static FLOOR_RULES: &[Rule<String>] = &[
    Rule {
        name: "numeric",
        apply: numeric_floor,
    },
    Rule {
        name: "level_phrase",
        apply: floor_level,
    },
];

/// Fields parsed from card text, before URL and district are attached
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardFields {
    pub price: Option<u64>,
    pub size: Option<u64>,
    pub price_per_unit: Option<u64>,
    pub rooms: Option<u32>,
    pub floor: Option<String>,
    pub building_name: String,
    pub address: String,
}

/// Strip thousands separators and parse
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    cleaned.trim_end_matches('.').parse::<f64>().ok()
}

fn parse_count(raw: &str) -> Option<u64> {
    parse_number(raw)
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.trunc() as u64)
}

fn per_unit_group(caps: &Captures) -> Option<u64> {
    caps.get(2).and_then(|m| parse_count(m.as_str()))
}

fn english_price(text: &str) -> Option<PriceQuote> {
    let caps = RE_PRICE_EN.captures(text)?;
    let millions = parse_number(&caps[1])?;
    let total = (millions * 1_000_000.0).round();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some(PriceQuote {
        total: total as u64,
        per_unit: per_unit_group(&caps),
    })
}

fn chinese_price(text: &str) -> Option<PriceQuote> {
    let caps = RE_PRICE_ZH.captures(text)?;
    let wan = parse_count(&caps[1])?;
    Some(PriceQuote {
        total: wan.checked_mul(10_000)?,
        per_unit: per_unit_group(&caps),
    })
}

fn size_with_unit(text: &str) -> Option<u64> {
    let caps = RE_SIZE.captures(text)?;
    parse_count(&caps[1])
}

fn rooms_after_unit(text: &str) -> Option<u32> {
    RE_ROOMS_AFTER_UNIT.captures(text)?[1].parse().ok()
}

fn rooms_before_facing(text: &str) -> Option<u32> {
    RE_ROOMS_FACING.captures(text)?[1].parse().ok()
}

fn numeric_floor(text: &str) -> Option<String> {
    let caps = RE_FLOOR_NUMERIC.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn floor_level(text: &str) -> Option<String> {
    RE_FLOOR_LEVEL.find(text).map(|m| m.as_str().to_string())
}

/// Lines that are not purely numbers or price punctuation
fn text_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !RE_NUMERIC_LINE.is_match(line))
        .collect()
}

/// Parse the text of one card. `None` when neither price nor size is present.
pub fn extract_fields(text: &str) -> Option<CardFields> {
    let quote = first_match(PRICE_RULES, text).map(|(rule, quote)| {
        trace!(rule, total = quote.total, "price matched");
        quote
    });
    let size = first_match(SIZE_RULES, text).map(|(_, size)| size);

    let price = quote.map(|q| q.total);
    if price.is_none() && size.is_none() {
        return None;
    }

    let price_per_unit = quote.and_then(|q| q.per_unit).or_else(|| match (price, size) {
        (Some(p), Some(s)) if s > 0 => Some((p as f64 / s as f64).round() as u64),
        _ => None,
    });

    let lines = text_lines(text);
    let building_name = lines.first().map(|l| l.to_string()).unwrap_or_default();
    let address = lines.iter().take(3).copied().collect::<Vec<_>>().join(", ");

    Some(CardFields {
        price,
        size,
        price_per_unit,
        rooms: first_match(ROOM_RULES, text).map(|(_, rooms)| rooms),
        floor: first_match(FLOOR_RULES, text).map(|(_, floor)| floor),
        building_name,
        address,
    })
}

/// Pick the listing link out of a card's anchors
pub fn listing_url(card: ElementRef, base: &Url) -> Option<Url> {
    let mut chosen: Option<Url> = None;

    for anchor in card.select(&ANCHOR) {
        let href = anchor.value().attr("href").unwrap_or("").trim();
        if href.is_empty() {
            continue;
        }
        let Ok(full) = base.join(href) else {
            continue;
        };
        let s = full.as_str();
        if RE_IMAGE_LINK.is_match(s) {
            continue;
        }
        if !(s.contains("property") || s.contains("/buy/") || s.contains("/apartment/")) {
            continue;
        }
        if s.contains("property-") {
            return Some(full);
        }
        if chosen.is_none() {
            chosen = Some(full);
        }
    }

    chosen
}

/// Card text with one line per text node
pub fn card_text(card: ElementRef) -> String {
    card.text().collect::<Vec<_>>().join("\n")
}

/// Turn one card into an output row
pub fn parse_card(card: ElementRef, base: &Url, district: &str) -> Option<ListingRow> {
    let text = card_text(card);
    let Some(fields) = extract_fields(&text) else {
        trace!(district, "card dropped: no price or size");
        return None;
    };

    Some(ListingRow {
        url: listing_url(card, base)
            .map(|u| u.to_string())
            .unwrap_or_default(),
        district: district.to_string(),
        address: fields.address,
        building_name: fields.building_name,
        price: fields.price,
        size: fields.size,
        price_per_unit: fields.price_per_unit,
        rooms: fields.rooms,
        floor: fields.floor,
        listed_date: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const EN_CARD: &str = "The Belcher's\nWestern Mid-Levels\nFlat B, High Floor, 5\nSell HKD$26.5 Millions @22,727\n1,166 ft²\n3\n2\nSouth";

    #[test]
    fn english_price_in_millions() {
        let fields = extract_fields(EN_CARD).unwrap();
        assert_eq!(fields.price, Some(26_500_000));
        assert_eq!(fields.price_per_unit, Some(22_727));
        assert_eq!(fields.size, Some(1166));
    }

    #[test]
    fn fractional_millions_round_to_whole_dollars() {
        let fields = extract_fields("Sell HKD $1.15 Millions").unwrap();
        assert_eq!(fields.price, Some(1_150_000));
    }

    #[test]
    fn chinese_price_in_wan() {
        let fields = extract_fields("嘉亨灣\n售 $1,180 萬元 @11,379 元\n1,037 呎").unwrap();
        assert_eq!(fields.price, Some(11_800_000));
        assert_eq!(fields.price_per_unit, Some(11_379));
        assert_eq!(fields.size, Some(1037));
    }

    #[test]
    fn english_rule_wins_over_chinese() {
        let (rule, quote) =
            first_match(PRICE_RULES, "Sell HKD$8 Millions\n售 $900 萬元").unwrap();
        assert_eq!(rule, "english_millions");
        assert_eq!(quote.total, 8_000_000);
    }

    #[test]
    fn per_unit_derived_from_size() {
        let fields = extract_fields("Tower 1\nSell HKD$12 Millions\n1,166 ft²").unwrap();
        assert_eq!(fields.price_per_unit, Some((12_000_000f64 / 1166.0).round() as u64));
        assert_eq!(fields.price_per_unit, Some(10_292));
    }

    #[test]
    fn size_only_card_kept_without_per_unit() {
        let fields = extract_fields("Some Court\n650 sq ft").unwrap();
        assert_eq!(fields.price, None);
        assert_eq!(fields.size, Some(650));
        assert_eq!(fields.price_per_unit, None);
    }

    #[test]
    fn card_without_price_or_size_dropped() {
        assert!(extract_fields("Image\nView on map\nContact agent").is_none());
    }

    #[test]
    fn rooms_follow_area_unit() {
        let fields = extract_fields(EN_CARD).unwrap();
        assert_eq!(fields.rooms, Some(3));
    }

    #[test]
    fn rooms_fall_back_to_facing() {
        assert_eq!(rooms_before_facing("2 1 North"), Some(2));
        assert_eq!(rooms_before_facing("3 東南向"), Some(3));
        assert_eq!(rooms_before_facing("Kowloon Bay"), None);
        assert_eq!(rooms_before_facing("3\nSouth East"), Some(3));
        assert_eq!(rooms_before_facing("3 向"), Some(3));
    }

    #[test]
    fn district_names_are_not_facings() {
        assert_eq!(rooms_before_facing("Block 2\nNorth Point"), None);
        assert_eq!(rooms_before_facing("Tower 5 Westlands Centre"), None);
        let fields = extract_fields("Block 2\nNorth Point\nSell HKD$7 Millions").unwrap();
        assert_eq!(fields.rooms, None);
    }

    #[test]
    fn numeric_floor_overrides_level_phrase() {
        let fields = extract_fields(EN_CARD).unwrap();
        assert_eq!(fields.floor.as_deref(), Some("5"));
    }

    #[test]
    fn level_phrase_used_alone() {
        let fields = extract_fields("Park Towers\nLow Floor\nSell HKD$9 Millions").unwrap();
        assert_eq!(fields.floor.as_deref(), Some("Low Floor"));
    }

    #[test]
    fn short_floor_suffix() {
        assert_eq!(numeric_floor("Block A 23F"), Some("23".to_string()));
    }

    #[test]
    fn address_from_first_text_lines() {
        let fields = extract_fields(EN_CARD).unwrap();
        assert_eq!(fields.building_name, "The Belcher's");
        assert_eq!(
            fields.address,
            "The Belcher's, Western Mid-Levels, Flat B, High Floor, 5"
        );
    }

    #[test]
    fn numeric_lines_skipped_for_address() {
        let fields = extract_fields("  \n1,166\n$ 3.5\nHarbour View\nSell HKD$3.5 Millions").unwrap();
        assert_eq!(fields.building_name, "Harbour View");
    }

    #[test]
    fn property_link_preferred_over_buy_link() {
        let html = Html::parse_fragment(
            r#"<div>
                <a href="/img/cover.jpg">img</a>
                <a href="/en/buy/a1/">district</a>
                <a href="/en/buy/property-12345">listing</a>
            </div>"#,
        );
        let base = Url::parse("https://www.squarefoot.com.hk").unwrap();
        let url = listing_url(html.root_element(), &base).unwrap();
        assert_eq!(url.as_str(), "https://www.squarefoot.com.hk/en/buy/property-12345");
    }

    #[test]
    fn image_links_ignored() {
        let html = Html::parse_fragment(
            r#"<div><a href="https://cdn.example.com/property/1.webp?w=300">x</a></div>"#,
        );
        let base = Url::parse("https://www.squarefoot.com.hk").unwrap();
        assert!(listing_url(html.root_element(), &base).is_none());
    }

    #[test]
    fn parse_card_builds_row() {
        let html = Html::parse_fragment(
            r#"<div class="item property_item">
                <a href="/en/buy/property-777"><span>Grand Promenade</span></a>
                <div>Sai Wan Ho</div>
                <div>Sell HKD$10.8 Millions @14,400</div>
                <div>750 ft²</div><div>2</div><div>1</div>
            </div>"#,
        );
        let base = Url::parse("https://www.squarefoot.com.hk").unwrap();
        let row = parse_card(html.root_element(), &base, "Hong Kong Island").unwrap();
        assert_eq!(row.url, "https://www.squarefoot.com.hk/en/buy/property-777");
        assert_eq!(row.building_name, "Grand Promenade");
        assert_eq!(row.price, Some(10_800_000));
        assert_eq!(row.rooms, Some(2));
        assert_eq!(row.district, "Hong Kong Island");
        assert!(row.listed_date.is_empty());
    }
}
