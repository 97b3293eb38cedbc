//! Manifest URL extraction for play pages
//!
//! The player state is serialized as JSON inside inline scripts, so URLs show
//! up with escaped slashes (`https:\/\/cdn...`). Scripts are searched in
//! document order and the first usable URL wins; a native `<video>` source is
//! the last resort.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::debug;
use url::Url;
use utoipa::ToSchema;

use super::normalize::resolve_url;
use super::{attr_value, script_blocks, ExtractorConfig};

const HLS_EXTENSION: &str = ".m3u8";

/// Builds the pattern for one extension: scheme, any number of escaped or
/// plain slashes, the shortest path reaching the extension, optional query.
fn extension_pattern(extension: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r#"https?:(?:\\*/|\\u002[fF]){{2}}[^\s"'<>(),;{{}}]*?{}(?:\?[^\s"'<>(),;{{}}]*)?"#,
        regex::escape(extension)
    ))
}

static HLS_URL: LazyLock<Regex> =
    LazyLock::new(|| extension_pattern(".m3u8").expect("static regex"));
static MP4_URL: LazyLock<Regex> =
    LazyLock::new(|| extension_pattern(".mp4").expect("static regex"));
static MEDIA_SOURCE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("video[src], video source[src], source[src]").expect("static selector")
});

/// Kind of media behind a manifest URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    /// HTTP Live Streaming playlist (`.m3u8`)
    Hls,
    /// Single progressive-download file
    Progressive,
}

impl MediaType {
    pub fn classify(url: &str) -> Self {
        if url.contains(HLS_EXTENSION) {
            MediaType::Hls
        } else {
            MediaType::Progressive
        }
    }
}

/// Outcome of a manifest search
///
/// Not finding a URL is an expected outcome (geo-locked or extra obfuscation),
/// so it is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManifestResult {
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_type: Option<MediaType>,
}

impl ManifestResult {
    /// A located URL, classified by extension
    pub fn found(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            found: true,
            media_type: Some(MediaType::classify(&url)),
            url: Some(url),
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            url: None,
            media_type: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.found
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn media_type(&self) -> Option<MediaType> {
        self.media_type
    }
}

/// Undo the escaping JSON-in-script serialization puts on URLs
pub fn unescape_url(raw: &str) -> String {
    raw.replace("\\u002F", "/")
        .replace("\\u002f", "/")
        .replace("\\u0026", "&")
        .replace("\\u003D", "=")
        .replace("\\u003d", "=")
        .replace("\\/", "/")
        .replace('\\', "")
}

fn pattern_for(extension: &str) -> Option<Cow<'static, Regex>> {
    match extension {
        ".m3u8" => Some(Cow::Borrowed(&*HLS_URL)),
        ".mp4" => Some(Cow::Borrowed(&*MP4_URL)),
        other => extension_pattern(other).ok().map(Cow::Owned),
    }
}

/// Cut a match down to its innermost URL when a path embeds another scheme
///
/// Only the part before the extension is searched, so URLs carried in the
/// query string never replace the manifest itself.
fn innermost_url<'m>(matched: &'m str, extension: &str) -> &'m str {
    let path_end = matched.find(extension).unwrap_or(matched.len());
    let start = ["https:", "http:"]
        .iter()
        .filter_map(|scheme| matched[..path_end].rfind(scheme))
        .max()
        .unwrap_or(0);
    &matched[start..]
}

fn is_ignored_host(url: &Url, ignored: &[&str]) -> bool {
    url.host_str()
        .is_some_and(|host| ignored.iter().any(|fragment| host.contains(fragment)))
}

/// The host ignore list only applies to progressive files; HLS playlists are
/// kept wherever they are hosted.
fn is_excluded(url: &Url, config: &ExtractorConfig) -> bool {
    MediaType::classify(url.as_str()) == MediaType::Progressive
        && is_ignored_host(url, config.ignored_media_hosts)
}

/// Normalize a candidate and keep it if it is a well-formed, allowed URL
fn accept(raw: &str, extension: &str, config: &ExtractorConfig) -> Option<String> {
    let candidate = unescape_url(innermost_url(raw, extension));
    let parsed = Url::parse(&candidate).ok()?;
    if is_excluded(&parsed, config) {
        debug!("Ignoring media URL on excluded host: {}", candidate);
        return None;
    }
    Some(candidate)
}

/// Manifest URL inside a single script block, extensions tried in order
pub fn find_in_script(text: &str, config: &ExtractorConfig) -> Option<String> {
    config
        .manifest_extensions
        .iter()
        .filter(|extension| text.contains(*extension))
        .find_map(|extension| {
            let pattern = pattern_for(extension)?;
            let found = pattern
                .find_iter(text)
                .find_map(|m| accept(m.as_str(), extension, config));
            found
        })
}

/// `src` of the first native media element, resolved against the origin
fn find_in_media_elements(document: &Html, origin: &str, config: &ExtractorConfig) -> Option<String> {
    document
        .select(&MEDIA_SOURCE_SELECTOR)
        .filter_map(|el| attr_value(el, "src"))
        .filter(|src| !src.starts_with("blob:"))
        .map(|src| resolve_url(src, origin))
        .find(|url| {
            Url::parse(url).is_ok_and(|parsed| !is_excluded(&parsed, config))
        })
}

/// Locate the manifest on a parsed play page
pub fn extract_from_document(document: &Html, origin: &str, config: &ExtractorConfig) -> ManifestResult {
    let from_scripts = script_blocks(document).find_map(|block| find_in_script(&block.text, config));

    match from_scripts.or_else(|| find_in_media_elements(document, origin, config)) {
        Some(url) => {
            debug!("Manifest located: {}", url);
            ManifestResult::found(url)
        }
        None => ManifestResult::not_found(),
    }
}

/// Classify a URL captured from browser network traffic
///
/// Returns `None` for anything that is not a manifest request.
pub fn classify_network_request(url: &str, config: &ExtractorConfig) -> Option<ManifestResult> {
    if !config
        .manifest_extensions
        .iter()
        .any(|extension| url.contains(extension))
    {
        return None;
    }

    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || is_excluded(&parsed, config) {
        return None;
    }

    Some(ManifestResult::found(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://example.test";

    fn manifest(html: &str) -> ManifestResult {
        extract_from_document(&Html::parse_document(html), ORIGIN, &ExtractorConfig::default())
    }

    #[test]
    fn test_escaped_hls_url() {
        let html = r#"<script>self.__next_f.push({"video":"https:\/\/cdn.test\/v\/x.m3u8"})</script>"#;
        let result = manifest(html);
        assert!(result.is_found());
        assert_eq!(result.url(), Some("https://cdn.test/v/x.m3u8"));
        assert_eq!(result.media_type(), Some(MediaType::Hls));
    }

    #[test]
    fn test_double_escaped_url_with_query() {
        let html = r#"<script>var s = "{\"src\":\"https:\\\/\\\/cdn.test\\\/v\\\/ep1.m3u8?auth=abc\\u0026exp=9\"}";</script>"#;
        let result = manifest(html);
        assert_eq!(result.url(), Some("https://cdn.test/v/ep1.m3u8?auth=abc&exp=9"));
    }

    #[test]
    fn test_unicode_escaped_slashes() {
        let html = r#"<script>p = {"u":"https:\u002F\u002Fcdn.test\u002Fa.mp4"}</script>"#;
        let result = manifest(html);
        assert_eq!(result.url(), Some("https://cdn.test/a.mp4"));
        assert_eq!(result.media_type(), Some(MediaType::Progressive));
    }

    #[test]
    fn test_plain_mp4_is_progressive() {
        let html = r#"<script>player.load("https://cdn.test/full/ep2.mp4");</script>"#;
        let result = manifest(html);
        assert_eq!(result.url(), Some("https://cdn.test/full/ep2.mp4"));
        assert_eq!(result.media_type(), Some(MediaType::Progressive));
    }

    #[test]
    fn test_earlier_script_wins() {
        let html = r#"
            <script>var a = {"play":"https://cdn.test/first.mp4"};</script>
            <script>var b = {"play":"https://cdn.test/second.m3u8"};</script>
        "#;
        assert_eq!(manifest(html).url(), Some("https://cdn.test/first.mp4"));
    }

    #[test]
    fn test_hls_preferred_within_one_script() {
        let html = r#"<script>var p = {"mp4":"https://cdn.test/a.mp4","hls":"https://cdn.test/a.m3u8"};</script>"#;
        assert_eq!(manifest(html).url(), Some("https://cdn.test/a.m3u8"));
    }

    #[test]
    fn test_match_stops_at_quote() {
        let html = r#"<script>x = {"poster":"https://img.test/p.jpg","src":"https://cdn.test/v.m3u8"}</script>"#;
        assert_eq!(manifest(html).url(), Some("https://cdn.test/v.m3u8"));
    }

    #[test]
    fn test_ignored_host_skipped() {
        let html = r#"<script>ads("https://googleads.g.doubleclick.google.com/ad.mp4", "https://cdn.test/real.mp4")</script>"#;
        assert_eq!(manifest(html).url(), Some("https://cdn.test/real.mp4"));
    }

    #[test]
    fn test_video_element_fallback() {
        let html = r#"<html><body><video controls><source src="/media/ep3.mp4" type="video/mp4"></video></body></html>"#;
        let result = manifest(html);
        assert_eq!(result.url(), Some("https://example.test/media/ep3.mp4"));
        assert_eq!(result.media_type(), Some(MediaType::Progressive));
    }

    #[test]
    fn test_video_element_blob_ignored() {
        let html = r#"<video src="blob:https://example.test/1234"></video>"#;
        assert!(!manifest(html).is_found());
    }

    #[test]
    fn test_not_found() {
        let html = r#"<html><body><script>var x = 1;</script><p>Locked</p></body></html>"#;
        let result = manifest(html);
        assert_eq!(result, ManifestResult::not_found());
        assert_eq!(result.url(), None);
    }

    #[test]
    fn test_extension_without_url_in_script() {
        let html = r#"<script>var ext = ".m3u8";</script>"#;
        assert!(!manifest(html).is_found());
    }

    #[test]
    fn test_unescape_url() {
        assert_eq!(unescape_url(r"https:\/\/a.test\/b.m3u8"), "https://a.test/b.m3u8");
        assert_eq!(unescape_url(r"https://a.test/b.m3u8?x=1&y=2"), "https://a.test/b.m3u8?x=1&y=2");
    }

    #[test]
    fn test_innermost_url() {
        assert_eq!(
            innermost_url("https://proxy.test/https://cdn.test/a.m3u8", ".m3u8"),
            "https://cdn.test/a.m3u8"
        );
        assert_eq!(innermost_url("https://cdn.test/a.m3u8", ".m3u8"), "https://cdn.test/a.m3u8");
        assert_eq!(
            innermost_url("https://cdn.test/a.mp4?back=http://site.test/p", ".mp4"),
            "https://cdn.test/a.mp4?back=http://site.test/p"
        );
    }

    #[test]
    fn test_url_in_query_string_is_not_the_manifest() {
        let html = r#"<script>var p = {"src":"https:\/\/cdn.test\/v\/x.m3u8?ref=https:\/\/site.test\/page"};</script>"#;
        let result = manifest(html);
        assert_eq!(result.url(), Some("https://cdn.test/v/x.m3u8?ref=https://site.test/page"));
        assert_eq!(result.media_type(), Some(MediaType::Hls));

        let html = r#"<script>player.load("https://cdn.test/ep1.mp4?sig=abc&back=http://example.test/play/1");</script>"#;
        let result = manifest(html);
        assert_eq!(
            result.url(),
            Some("https://cdn.test/ep1.mp4?sig=abc&back=http://example.test/play/1")
        );
        assert_eq!(result.media_type(), Some(MediaType::Progressive));
    }

    #[test]
    fn test_hls_on_ignored_host_is_kept() {
        let url = "https://storage.googleapis.com/bucket/ep1/index.m3u8";
        let config = ExtractorConfig::default();

        let classified = classify_network_request(url, &config).unwrap();
        assert_eq!(classified.url(), Some(url));
        assert_eq!(classified.media_type(), Some(MediaType::Hls));

        let html = format!(r#"<script>var p = {{"hls":"{url}"}};</script>"#);
        assert_eq!(manifest(&html).url(), Some(url));

        let mp4 = "https://storage.googleapis.com/bucket/ep1/full.mp4";
        assert!(classify_network_request(mp4, &config).is_none());
    }

    #[test]
    fn test_classify_network_request() {
        let config = ExtractorConfig::default();
        let hls = classify_network_request("https://cdn.test/live/index.m3u8?t=1", &config).unwrap();
        assert_eq!(hls.media_type(), Some(MediaType::Hls));

        assert!(classify_network_request("https://cdn.test/app.js", &config).is_none());
        assert!(classify_network_request("https://www.google.com/promo.mp4", &config).is_none());
    }

    #[test]
    fn test_manifest_result_serialization() {
        let found = serde_json::to_value(ManifestResult::found("https://cdn.test/x.m3u8")).unwrap();
        assert_eq!(
            found,
            serde_json::json!({"found": true, "url": "https://cdn.test/x.m3u8", "mediaType": "HLS"})
        );

        let missing = serde_json::to_value(ManifestResult::not_found()).unwrap();
        assert_eq!(missing, serde_json::json!({"found": false}));
    }
}
