use crate::scrapers::extract::card_text;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

static EXACT_CLASSES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".item.property_item, .content.sqfoot_property_card")
        .expect("invalid selector: exact card classes")
});

static PROPERTY_ITEM_MARKER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div[class*='property_item']").expect("invalid selector: property_item marker")
});

static PROPERTY_AND_ITEM: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[class*='property'][class*='item']")
        .expect("invalid selector: property and item")
});

static GENERIC_CONTAINERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.item, div[class*='card']").expect("invalid selector: generic containers")
});

const PRICE_MARKERS: [&str; 3] = ["Sell HKD", "HKD$", "萬元"];
const AREA_MARKERS: [&str; 2] = ["ft²", "呎"];

/// Which selector produced the cards of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStrategy {
    ExactClasses,
    PropertyItemMarker,
    PropertyAndItem,
    TextHeuristic,
}

impl CardStrategy {
    pub const CASCADE: [CardStrategy; 4] = [
        CardStrategy::ExactClasses,
        CardStrategy::PropertyItemMarker,
        CardStrategy::PropertyAndItem,
        CardStrategy::TextHeuristic,
    ];

    fn select<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        match self {
            CardStrategy::ExactClasses => document.select(&EXACT_CLASSES).collect(),
            CardStrategy::PropertyItemMarker => document.select(&PROPERTY_ITEM_MARKER).collect(),
            CardStrategy::PropertyAndItem => document.select(&PROPERTY_AND_ITEM).collect(),
            CardStrategy::TextHeuristic => document
                .select(&GENERIC_CONTAINERS)
                .filter(|el| looks_like_listing(&card_text(*el)))
                .collect(),
        }
    }
}

fn looks_like_listing(text: &str) -> bool {
    PRICE_MARKERS.iter().any(|m| text.contains(m)) && AREA_MARKERS.iter().any(|m| text.contains(m))
}

/// Candidate listing cards, from the first strategy that finds any
pub fn locate_cards(document: &Html) -> (Option<CardStrategy>, Vec<ElementRef<'_>>) {
    for strategy in CardStrategy::CASCADE {
        let cards = strategy.select(document);
        if !cards.is_empty() {
            debug!(?strategy, count = cards.len(), "Located listing cards");
            return (Some(strategy), cards);
        }
    }
    debug!("No listing cards located");
    (None, Vec::new())
}
