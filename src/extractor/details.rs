//! Drama details on a play page
//!
//! Title, synopsis and poster come from the hydration state when available,
//! otherwise from the rendered heading and description blocks.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Serialize;
use utoipa::ToSchema;

use super::normalize::resolve_url;
use super::{attr_value, element_text, first_text, state, ExtractorConfig};

static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("static selector"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("static selector"));
static DESCRIPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".description, .synopsis").expect("static selector"));
static POSTER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img.cover, .poster img").expect("static selector"));

/// Drama metadata shown next to a stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayDetails {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Absolute poster URL
    pub poster: Option<String>,
}

fn first_element_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

pub fn extract_from_document(document: &Html, origin: &str, config: &ExtractorConfig) -> PlayDetails {
    let state = state::find_state(document, config.state_markers);
    let info = state
        .as_ref()
        .and_then(|state| state::locate_object(state, config.drama_info_paths));

    let fields = &config.fields;
    let title = info
        .and_then(|info| first_text(info, fields.title))
        .or_else(|| first_element_text(document, &HEADING_SELECTOR))
        .or_else(|| first_element_text(document, &TITLE_SELECTOR));

    let description = info
        .and_then(|info| first_text(info, fields.description))
        .or_else(|| first_element_text(document, &DESCRIPTION_SELECTOR));

    let poster = info
        .and_then(|info| first_text(info, fields.cover))
        .or_else(|| {
            document.select(&POSTER_SELECTOR).find_map(|img| {
                config
                    .image_attributes
                    .iter()
                    .find_map(|name| attr_value(img, name))
                    .map(str::to_string)
            })
        })
        .map(|poster| resolve_url(&poster, origin));

    PlayDetails {
        title,
        description,
        poster,
    }
}
