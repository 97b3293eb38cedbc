//! Structured-state strategy
//!
//! SSR frameworks embed the page's data as JSON inside a script block
//! (`__NEXT_DATA__`, `window.__NUXT__ = {...}` and friends). When present it is
//! the most reliable source, so the listing extractor tries it first.

use scraper::Html;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::{script_blocks, ExtractorConfig, RawRecord};

/// Why a candidate state block could not be used
#[derive(Debug, Error)]
pub enum StateParseError {
    /// No `{ ... }` span in the block
    #[error("Block contains no JSON object")]
    NoObject,

    /// The `{ ... }` span is not valid JSON
    #[error("Invalid state JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whether a script block carries hydration state
fn is_state_block(id: Option<&str>, text: &str, markers: &[&str]) -> bool {
    markers
        .iter()
        .any(|marker| id == Some(*marker) || text.contains(marker))
}

/// Parse the span between the first `{` and the last `}` of a block
pub fn parse_state_block(text: &str) -> Result<Value, StateParseError> {
    let start = text.find('{').ok_or(StateParseError::NoObject)?;
    let end = text.rfind('}').ok_or(StateParseError::NoObject)?;
    if end < start {
        return Err(StateParseError::NoObject);
    }

    Ok(serde_json::from_str(&text[start..=end])?)
}

/// First state block in the document that parses as JSON
///
/// A block that fails to parse is skipped and the scan moves on.
pub fn find_state(document: &Html, markers: &[&str]) -> Option<Value> {
    script_blocks(document)
        .filter(|block| is_state_block(block.id, &block.text, markers))
        .find_map(|block| match parse_state_block(&block.text) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Skipping state block: {}", e);
                None
            }
        })
}

/// First non-empty array found at one of `paths` (JSON pointers)
pub fn locate_items<'v>(state: &'v Value, paths: &[&str]) -> Option<&'v [Value]> {
    paths.iter().find_map(|path| {
        state
            .pointer(path)
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
            .map(Vec::as_slice)
    })
}

/// First object found at one of `paths` (JSON pointers)
pub fn locate_object<'v>(state: &'v Value, paths: &[&str]) -> Option<&'v Map<String, Value>> {
    paths
        .iter()
        .find_map(|path| state.pointer(path).and_then(Value::as_object))
}

/// Raw item records from the page's hydration state, if any
///
/// `None` means the strategy did not apply and the caller should fall back.
/// Non-object array entries are kept out; they could never pass validation.
pub fn structured_records(document: &Html, config: &ExtractorConfig) -> Option<Vec<RawRecord>> {
    let state = find_state(document, config.state_markers)?;
    let Some(items) = locate_items(&state, config.item_paths) else {
        debug!("State found but no known item path matched");
        return None;
    };

    debug!("Structured state holds {} raw items", items.len());
    Some(
        items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::extraction::{ITEM_PATHS, STATE_MARKERS};
    use serde_json::json;

    #[test]
    fn test_parse_state_block_assignment() {
        let value = parse_state_block(r#"window.__NUXT__ = {"a":{"b":1}};"#).unwrap();
        assert_eq!(value, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_parse_state_block_without_object() {
        assert!(matches!(
            parse_state_block("var x = 1;"),
            Err(StateParseError::NoObject)
        ));
        assert!(matches!(
            parse_state_block("} oops {"),
            Err(StateParseError::NoObject)
        ));
    }

    #[test]
    fn test_parse_state_block_invalid_json() {
        assert!(matches!(
            parse_state_block("window.__NUXT__ = {a: function() {}}"),
            Err(StateParseError::Json(_))
        ));
    }

    #[test]
    fn test_find_state_by_element_id() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">{"page":"/"}</script>"#;
        let document = Html::parse_document(html);
        assert_eq!(find_state(&document, STATE_MARKERS), Some(json!({"page": "/"})));
    }

    #[test]
    fn test_find_state_skips_malformed_block() {
        let html = r#"
            <script>window.__INITIAL_STATE__ = {"broken": </script>
            <script>analytics({"id": 1});</script>
            <script>window.__NUXT__ = {"ok": true};</script>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(find_state(&document, STATE_MARKERS), Some(json!({"ok": true})));
    }

    #[test]
    fn test_find_state_ignores_unmarked_scripts() {
        let html = r#"<script>var config = {"list": [1, 2]};</script>"#;
        let document = Html::parse_document(html);
        assert_eq!(find_state(&document, STATE_MARKERS), None);
    }

    #[test]
    fn test_locate_items_first_non_empty_path_wins() {
        let state = json!({
            "props": {"pageProps": {"initialData": {"list": []}, "list": [{"id": 1}]}},
            "list": [{"id": 2}]
        });
        let items = locate_items(&state, ITEM_PATHS).unwrap();
        assert_eq!(items, &[json!({"id": 1})]);
    }

    #[test]
    fn test_locate_items_none_when_no_path_matches() {
        let state = json!({"props": {"pageProps": {"banner": [1]}}});
        assert!(locate_items(&state, ITEM_PATHS).is_none());
    }

    #[test]
    fn test_locate_object() {
        let state = json!({"props": {"pageProps": {"dramaInfo": {"title": "X"}}}});
        let info = locate_object(&state, &["/missing", "/props/pageProps/dramaInfo"]).unwrap();
        assert_eq!(info.get("title"), Some(&json!("X")));
    }

    #[test]
    fn test_structured_records_skips_non_objects() {
        let html = r#"<script>window.__INITIAL_STATE__ = {"data":{"list":[{"id":1}, 5, "x"]}}</script>"#;
        let document = Html::parse_document(html);
        let records = structured_records(&document, &ExtractorConfig::default()).unwrap();
        assert_eq!(records.len(), 1);
    }
}
