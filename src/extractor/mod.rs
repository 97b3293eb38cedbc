//! Extraction pipeline for short-drama pages
//!
//! Turns raw markup from an uncontrolled upstream site into structured
//! listing items or a playable manifest URL. Every strategy here is pure:
//! callers fetch the page, the extractor only reads the text it is handed.
//!
//! Listing pages run the structured-state strategy first and fall back to DOM
//! card scraping. Play pages run the manifest search plus a best-effort read
//! of the drama details.

pub mod details;
pub mod dom;
pub mod manifest;
pub mod normalize;
pub mod state;

use std::str::FromStr;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use url::Url;
use utoipa::ToSchema;

use crate::constants::extraction;

pub use details::PlayDetails;
pub use manifest::{ManifestResult, MediaType};
pub use normalize::{ContentItem, FieldPolicy};

/// A loosely-typed item record as found upstream, before normalization
pub type RawRecord = Map<String, Value>;

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("static selector"));

/// Errors the extractor reports to its caller
///
/// Upstream pages that simply lack the data are not errors; those come back
/// as empty or not-found results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The origin URL is not an absolute http(s) URL
    #[error("Invalid origin URL '{url}': {reason}")]
    InvalidOrigin { url: String, reason: String },

    /// Page kind is neither "listing" nor "play"
    #[error("Unsupported page kind '{0}', expected 'listing' or 'play'")]
    InvalidPageKind(String),

    /// A lookup was attempted without its identifier
    #[error("{0} is required")]
    MissingIdentifier(&'static str),

    /// Episode numbers start at 1
    #[error("Invalid episode number '{0}', expected a positive integer")]
    InvalidEpisode(String),
}

/// Kind of upstream page being extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Listing,
    Play,
}

impl FromStr for PageKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "listing" => Ok(PageKind::Listing),
            "play" => Ok(PageKind::Play),
            other => Err(ExtractError::InvalidPageKind(other.to_string())),
        }
    }
}

/// Markup handed in by the caller together with where it came from
#[derive(Debug, Clone)]
pub struct RawPage<'a> {
    markup: &'a str,
    origin_url: &'a str,
    origin: String,
    kind: PageKind,
}

impl<'a> RawPage<'a> {
    /// Validate the origin URL and wrap the markup
    pub fn new(markup: &'a str, origin_url: &'a str, kind: PageKind) -> Result<Self, ExtractError> {
        let invalid = |reason: String| ExtractError::InvalidOrigin {
            url: origin_url.to_string(),
            reason,
        };

        let parsed = Url::parse(origin_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
        }
        if parsed.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        Ok(Self {
            markup,
            origin_url,
            origin: parsed.origin().ascii_serialization(),
            kind,
        })
    }

    pub fn markup(&self) -> &str {
        self.markup
    }

    pub fn origin_url(&self) -> &str {
        self.origin_url
    }

    /// Scheme, host and port of the origin URL, without a trailing slash
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }
}

/// Which strategy produced a listing result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Structured,
    Dom,
    None,
}

/// Items extracted from a listing page, in document order
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub items: Vec<ContentItem>,
    pub strategy_used: Strategy,
}

impl ExtractionResult {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            strategy_used: Strategy::None,
        }
    }
}

/// Everything read from a play page
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayPageResult {
    pub manifest: ManifestResult,
    pub details: PlayDetails,
}

/// Output of [`extract`], tagged by page kind
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "pageKind", rename_all = "lowercase")]
pub enum PageExtraction {
    Listing(ExtractionResult),
    Play(PlayPageResult),
}

/// Ordered lookup tables and limits for every strategy
///
/// The upstream shape is unstable, so orderings live here instead of being
/// hard-coded in the strategies.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub state_markers: &'static [&'static str],
    pub item_paths: &'static [&'static str],
    pub drama_info_paths: &'static [&'static str],
    pub card_selectors: &'static [&'static str],
    pub title_selectors: &'static [&'static str],
    pub image_attributes: &'static [&'static str],
    pub id_attributes: &'static [&'static str],
    pub manifest_extensions: &'static [&'static str],
    pub ignored_media_hosts: &'static [&'static str],
    pub fields: FieldPolicy,
    /// Upper bound on DOM fallback records per page
    pub max_dom_items: usize,
    /// Path prefix used to build a detail URL for structured items lacking one
    pub detail_path: &'static str,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            state_markers: extraction::STATE_MARKERS,
            item_paths: extraction::ITEM_PATHS,
            drama_info_paths: extraction::DRAMA_INFO_PATHS,
            card_selectors: extraction::CARD_SELECTORS,
            title_selectors: extraction::TITLE_SELECTORS,
            image_attributes: extraction::IMAGE_ATTRIBUTES,
            id_attributes: extraction::ID_ATTRIBUTES,
            manifest_extensions: extraction::MANIFEST_EXTENSIONS,
            ignored_media_hosts: extraction::IGNORED_MEDIA_HOSTS,
            fields: FieldPolicy::default(),
            max_dom_items: extraction::DEFAULT_MAX_DOM_ITEMS,
            detail_path: "/detail/",
        }
    }
}

impl ExtractorConfig {
    /// Default tables with a custom DOM item cap
    pub fn with_max_dom_items(max_dom_items: usize) -> Self {
        Self {
            max_dom_items,
            ..Self::default()
        }
    }
}

/// Run the extractor matching the page kind
pub fn extract(page: &RawPage<'_>, config: &ExtractorConfig) -> PageExtraction {
    let document = Html::parse_document(page.markup());
    match page.kind() {
        PageKind::Listing => {
            PageExtraction::Listing(listing_from_document(&document, page.origin(), config))
        }
        PageKind::Play => PageExtraction::Play(play_from_document(&document, page.origin(), config)),
    }
}

/// Manifest and drama details from a play page
pub fn extract_play(page: &RawPage<'_>, config: &ExtractorConfig) -> PlayPageResult {
    let document = Html::parse_document(page.markup());
    play_from_document(&document, page.origin(), config)
}

/// Extract listing items: structured state first, DOM cards second
pub fn extract_listing(page: &RawPage<'_>, config: &ExtractorConfig) -> ExtractionResult {
    let document = Html::parse_document(page.markup());
    listing_from_document(&document, page.origin(), config)
}

/// Locate the playable manifest on a play page
pub fn extract_manifest(page: &RawPage<'_>, config: &ExtractorConfig) -> ManifestResult {
    let document = Html::parse_document(page.markup());
    manifest::extract_from_document(&document, page.origin(), config)
}

/// Read drama title, description and poster from a play page
pub fn extract_play_details(page: &RawPage<'_>, config: &ExtractorConfig) -> PlayDetails {
    let document = Html::parse_document(page.markup());
    details::extract_from_document(&document, page.origin(), config)
}

fn play_from_document(document: &Html, origin: &str, config: &ExtractorConfig) -> PlayPageResult {
    PlayPageResult {
        manifest: manifest::extract_from_document(document, origin, config),
        details: details::extract_from_document(document, origin, config),
    }
}

fn listing_from_document(document: &Html, origin: &str, config: &ExtractorConfig) -> ExtractionResult {
    if let Some(records) = state::structured_records(document, config) {
        let detail_prefix = format!("{}{}", origin, config.detail_path);
        let items = normalize::normalize_items(records, origin, &config.fields, Some(detail_prefix.as_str()));
        if !items.is_empty() {
            return ExtractionResult {
                items,
                strategy_used: Strategy::Structured,
            };
        }
        debug!("Structured state held no valid items, trying DOM cards");
    }

    let records = dom::extract_records(document, config);
    let items = normalize::normalize_items(records, origin, &config.fields, None);
    if items.is_empty() {
        debug!("No strategy produced listing items");
        return ExtractionResult::empty();
    }

    ExtractionResult {
        items,
        strategy_used: Strategy::Dom,
    }
}

/// Reject a missing or blank drama id
pub fn require_id(id: Option<&str>) -> Result<&str, ExtractError> {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ExtractError::MissingIdentifier("Drama ID")),
    }
}

/// Parse an episode number, defaulting to the first episode
pub fn parse_episode(ep: Option<&str>) -> Result<u32, ExtractError> {
    let Some(raw) = ep.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(1);
    };
    match raw.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ExtractError::InvalidEpisode(raw.to_string())),
    }
}

/// A `<script>` element's id attribute and text content
pub(crate) struct ScriptBlock<'d> {
    pub id: Option<&'d str>,
    pub text: String,
}

/// Script blocks in document order
pub(crate) fn script_blocks(document: &Html) -> impl Iterator<Item = ScriptBlock<'_>> {
    document.select(&SCRIPT_SELECTOR).map(|el| ScriptBlock {
        id: el.value().attr("id"),
        text: el.text().collect(),
    })
}

/// Element text with runs of whitespace collapsed
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty, trimmed attribute value
pub(crate) fn attr_value<'d>(el: ElementRef<'d>, name: &str) -> Option<&'d str> {
    el.value().attr(name).map(str::trim).filter(|v| !v.is_empty())
}

/// First text value among `keys`, used for free-form fields like descriptions
pub(crate) fn first_text(record: &RawRecord, keys: &[&str]) -> Option<String> {
    normalize::first_truthy(record, keys).and_then(normalize::value_text)
}
