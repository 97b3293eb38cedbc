//! DOM fallback strategy
//!
//! When the page carries no usable hydration state, rebuild items from the
//! rendered cards. Card patterns are tried from most to least specific and the
//! first pattern that yields records wins.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{attr_value, element_text, ExtractorConfig, RawRecord};

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));
static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("static selector"));

/// Extract the last non-empty path segment of a link
///
/// Takes "/detail/42/" or "https://netshort.com/detail/42?from=home" and
/// returns "42".
pub fn id_from_link(link: &str) -> Option<String> {
    let path = match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// Links that point nowhere useful
fn is_navigable(href: &str) -> bool {
    !(href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:"))
}

/// The card itself when it is an anchor, otherwise its first anchor
fn card_anchor(node: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if node.value().name() == "a" && node.value().attr("href").is_some() {
        return Some(node);
    }
    node.select(&ANCHOR_SELECTOR).next()
}

fn card_title(node: ElementRef<'_>, config: &ExtractorConfig) -> Option<String> {
    let from_selectors = config
        .title_selectors
        .iter()
        .filter_map(|pattern| Selector::parse(pattern).ok())
        .find_map(|selector| {
            node.select(&selector)
                .map(element_text)
                .find(|text| !text.is_empty())
        });

    from_selectors
        .or_else(|| attr_value(node, "title").map(str::to_string))
        .or_else(|| {
            card_anchor(node)
                .map(element_text)
                .filter(|text| !text.is_empty())
        })
        .or_else(|| {
            node.select(&IMAGE_SELECTOR)
                .find_map(|img| attr_value(img, "alt"))
                .map(str::to_string)
        })
}

/// Image reference, skipping inline `data:` placeholders used by lazy loaders
fn card_image<'d>(node: ElementRef<'d>, config: &ExtractorConfig) -> Option<&'d str> {
    let usable = |img: ElementRef<'d>| {
        config
            .image_attributes
            .iter()
            .filter_map(|name| attr_value(img, name))
            .find(|value| !value.starts_with("data:"))
    };

    if node.value().name() == "img" {
        return usable(node);
    }
    node.select(&IMAGE_SELECTOR).find_map(usable)
}

fn card_link<'d>(node: ElementRef<'d>) -> Option<&'d str> {
    attr_value(node, "href")
        .or_else(|| card_anchor(node).and_then(|a| attr_value(a, "href")))
        .filter(|href| is_navigable(href))
}

/// Build a raw record from one matched card
///
/// Cards without both a title and an image are not items.
fn card_record(node: ElementRef<'_>, config: &ExtractorConfig) -> Option<RawRecord> {
    let title = card_title(node, config)?;
    let cover = card_image(node, config)?;
    let link = card_link(node);

    let id = config
        .id_attributes
        .iter()
        .find_map(|name| attr_value(node, name))
        .map(str::to_string)
        .or_else(|| link.and_then(id_from_link));

    let mut record = RawRecord::new();
    if let Some(id) = id {
        record.insert("id".to_string(), Value::String(id));
    }
    record.insert("title".to_string(), Value::String(title));
    record.insert("cover".to_string(), Value::String(cover.to_string()));
    if let Some(link) = link {
        record.insert("url".to_string(), Value::String(link.to_string()));
    }
    Some(record)
}

/// Raw item records from rendered cards, at most `config.max_dom_items`
pub fn extract_records(document: &Html, config: &ExtractorConfig) -> Vec<RawRecord> {
    if config.max_dom_items == 0 {
        return Vec::new();
    }

    for pattern in config.card_selectors {
        let selector = match Selector::parse(pattern) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Skipping invalid card selector {:?}: {:?}", pattern, e);
                continue;
            }
        };

        let records: Vec<RawRecord> = document
            .select(&selector)
            .filter_map(|node| card_record(node, config))
            .take(config.max_dom_items)
            .collect();

        if !records.is_empty() {
            debug!("Card pattern {:?} matched {} records", pattern, records.len());
            return records;
        }
    }

    Vec::new()
}
