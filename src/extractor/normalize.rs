//! Result normalizer
//!
//! Both strategies hand over loosely-keyed records. This module resolves each
//! logical field from an ordered list of candidate keys and makes URLs
//! absolute against the page origin.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::RawRecord;
use crate::constants::fields;

static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("static regex"));

/// Canonical listing entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Upstream identifier, unique within one extraction
    pub id: String,
    pub title: String,
    /// Absolute cover image URL
    pub cover_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
}

/// Candidate source keys per logical field, earliest first
#[derive(Debug, Clone)]
pub struct FieldPolicy {
    pub id: &'static [&'static str],
    pub title: &'static [&'static str],
    pub cover: &'static [&'static str],
    pub episodes: &'static [&'static str],
    pub detail: &'static [&'static str],
    pub description: &'static [&'static str],
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self {
            id: fields::ID,
            title: fields::TITLE,
            cover: fields::COVER,
            episodes: fields::EPISODES,
            detail: fields::DETAIL,
            description: fields::DESCRIPTION,
        }
    }
}

/// JavaScript-style truthiness
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Value of the first key that is present and truthy
pub fn first_truthy<'r>(record: &'r RawRecord, keys: &[&str]) -> Option<&'r Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| is_truthy(value))
}

/// Text form of a scalar value; numbers are stringified
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative integer from a number or a digit string
fn value_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Make `candidate` absolute against `origin`
///
/// Anything starting with a scheme passes through. Protocol-relative URLs
/// take the origin's scheme. Everything else is joined to the origin with
/// exactly one `/`.
pub fn resolve_url(candidate: &str, origin: &str) -> String {
    let candidate = candidate.trim();
    if SCHEME_PREFIX.is_match(candidate) {
        return candidate.to_string();
    }

    if let Some(rest) = candidate.strip_prefix("//") {
        let scheme = origin.split_once("://").map_or("https", |(scheme, _)| scheme);
        return format!("{}://{}", scheme, rest);
    }

    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        candidate.trim_start_matches('/')
    )
}

/// Shape one raw record into a [`ContentItem`]
///
/// Returns `None` when id, title or cover cannot be resolved. When
/// `detail_prefix` is given and the record has no detail reference, the
/// detail URL becomes `detail_prefix + id`.
pub fn normalize_record(
    record: &RawRecord,
    origin: &str,
    policy: &FieldPolicy,
    detail_prefix: Option<&str>,
) -> Option<ContentItem> {
    let id = first_truthy(record, policy.id).and_then(value_text)?;
    let title = first_truthy(record, policy.title).and_then(value_text)?;
    let cover = first_truthy(record, policy.cover).and_then(value_text)?;

    let episode_count = first_truthy(record, policy.episodes).and_then(value_count);
    let detail_url = first_truthy(record, policy.detail)
        .and_then(value_text)
        .or_else(|| detail_prefix.map(|prefix| format!("{}{}", prefix, id)));

    Some(ContentItem {
        cover_url: resolve_url(&cover, origin),
        id,
        title,
        episode_count,
        detail_url,
    })
}

/// Normalize records in order, dropping invalid ones and repeated ids
pub fn normalize_items<I>(
    records: I,
    origin: &str,
    policy: &FieldPolicy,
    detail_prefix: Option<&str>,
) -> Vec<ContentItem>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter_map(|record| normalize_record(&record, origin, policy, detail_prefix))
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Rooted paths join the origin with exactly one separator
        #[test]
        fn property_relative_urls_join_origin(path in "[a-z0-9]{1,10}(/[a-z0-9]{1,10}){0,3}\\.jpg", slashes in 0usize..2) {
            let candidate = format!("{}{}", "/".repeat(slashes), path);
            let resolved = resolve_url(&candidate, "https://example.test");
            prop_assert_eq!(resolved, format!("https://example.test/{}", path));
        }

        /// Absolute URLs are never rewritten
        #[test]
        fn property_absolute_urls_unchanged(host in "[a-z]{3,10}\\.test", path in "[a-z0-9/]{0,20}") {
            let url = format!("https://{}/{}", host, path);
            prop_assert_eq!(resolve_url(&url, "https://example.test"), url);
        }
    }
}
