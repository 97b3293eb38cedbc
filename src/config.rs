//! Configuration module for the Drama Scraper API
//!
//! Handles loading environment variables and application configuration.

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::constants::extraction::DEFAULT_MAX_DOM_ITEMS;
use crate::extractor::ExtractorConfig;
use crate::scraper::ScraperConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Origin of the upstream drama site
    pub base_url: String,
    /// Cap on records collected by the DOM fallback per page
    pub max_dom_items: usize,
    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
    /// Whether to rotate the User-Agent per request
    pub rotate_user_agent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "https://netshort.com".to_string(),
            max_dom_items: DEFAULT_MAX_DOM_ITEMS,
            request_timeout_secs: 30,
            rotate_user_agent: true,
        }
    }
}

/// Parse an optional variable, keeping the default when it is malformed
fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default", name, value);
            default
        }),
        None => default,
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Every variable is optional; missing or malformed values fall back to
    /// [`Config::default`].
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            base_url: lookup("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            max_dom_items: parse_or("MAX_DOM_ITEMS", lookup("MAX_DOM_ITEMS"), defaults.max_dom_items),
            request_timeout_secs: parse_or(
                "REQUEST_TIMEOUT_SECS",
                lookup("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout_secs,
            ),
            rotate_user_agent: parse_or(
                "ROTATE_USER_AGENT",
                lookup("ROTATE_USER_AGENT"),
                defaults.rotate_user_agent,
            ),
        }
    }

    /// Extraction tables with this deployment's limits
    pub fn extractor(&self) -> ExtractorConfig {
        ExtractorConfig::with_max_dom_items(self.max_dom_items)
    }

    /// HTTP client settings for upstream fetches
    pub fn scraper(&self) -> ScraperConfig {
        ScraperConfig {
            timeout_secs: self.request_timeout_secs,
            rotate_user_agent: self.rotate_user_agent,
            ..ScraperConfig::default()
        }
    }
}
