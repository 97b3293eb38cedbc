//! Scraper module for fetching HTML content from the target site
//!
//! This module provides an HTTP client with browser-like headers so the
//! upstream serves the same markup a desktop browser would get. It fetches
//! only; all parsing happens in [`crate::extractor`].

use rand::Rng;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during scraping operations
#[derive(Error, Debug)]
pub enum ScraperError {
    /// Network-related errors (connection timeout, DNS failure, etc.)
    #[error("Failed to connect to server: {0}")]
    NetworkError(String),

    /// HTTP non-200 status code errors
    #[error("Server returned status {0}")]
    HttpError(u16),

    /// Error reading response body
    #[error("Failed to read response body: {0}")]
    ResponseError(String),

    /// Rate limited by server
    #[error("Rate limited by upstream")]
    RateLimited,

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Result of a successful page fetch
#[derive(Debug)]
pub struct ScraperResult {
    /// The HTML content of the page
    pub html: String,
    /// Final URL after redirects
    pub final_url: String,
}

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Whether to rotate user agents
    pub rotate_user_agent: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            rotate_user_agent: true,
        }
    }
}

/// List of realistic user agents for rotation
const USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// HTTP client for fetching upstream pages
pub struct Scraper {
    client: Client,
    config: ScraperConfig,
}

impl Scraper {
    /// Create a new Scraper with custom configuration
    pub fn with_config(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ScraperError::ClientBuild(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Get a random user agent from the list
    fn get_user_agent(&self) -> &'static str {
        if self.config.rotate_user_agent {
            let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
            USER_AGENTS[idx]
        } else {
            USER_AGENTS[0]
        }
    }

    /// Client hints matching the user agent; empty for non-Chromium browsers
    fn get_sec_ch_ua(&self, user_agent: &str) -> Option<(&'static str, &'static str)> {
        if user_agent.contains("Chrome/120") && user_agent.contains("Macintosh") {
            Some((
                "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
                "\"macOS\"",
            ))
        } else if user_agent.contains("Chrome/120") {
            Some((
                "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
                "\"Windows\"",
            ))
        } else if user_agent.contains("Chrome/119") {
            Some((
                "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"119\", \"Google Chrome\";v=\"119\"",
                "\"Windows\"",
            ))
        } else {
            None
        }
    }

    /// Fetch a page from the given URL
    pub async fn fetch_page(&self, url: &str) -> Result<ScraperResult, ScraperError> {
        let user_agent = self.get_user_agent();

        let mut request = self
            .client
            .get(url)
            .header("User-Agent", user_agent)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Upgrade-Insecure-Requests", "1");

        if let Some((sec_ch_ua, platform)) = self.get_sec_ch_ua(user_agent) {
            request = request
                .header("Sec-Ch-Ua", sec_ch_ua)
                .header("Sec-Ch-Ua-Mobile", "?0")
                .header("Sec-Ch-Ua-Platform", platform);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ScraperError::NetworkError("Connection timeout".to_string())
            } else if e.is_connect() {
                ScraperError::NetworkError("Failed to connect to server".to_string())
            } else {
                ScraperError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Rate limited by upstream on {}", url);
            return Err(ScraperError::RateLimited);
        }

        if status != StatusCode::OK {
            return Err(ScraperError::HttpError(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| ScraperError::ResponseError(e.to_string()))?;

        Ok(ScraperResult { html, final_url })
    }
}
