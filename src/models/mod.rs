//! Data models for the Drama Scraper API
//!
//! Response envelopes and request bodies. Extraction types live in
//! [`crate::extractor`] and are re-exported here for convenience.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use crate::extractor::{
    ContentItem, ExtractionResult, ManifestResult, MediaType, PageExtraction, PageKind,
    PlayDetails, Strategy,
};

/// Generic API response wrapper for successful responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the operation was successful (always true for this type)
    pub success: bool,
    /// The response payload
    pub data: T,
    /// ISO timestamp of when data was fetched
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Create a new successful API response with the current timestamp
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Whether the operation was successful (always false for errors)
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
    /// ISO timestamp of when the error occurred
    pub timestamp: String,
}

impl ApiError {
    /// Create a new API error response with the current timestamp
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Trending listing payload
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendingResponse {
    /// Extracted dramas in page order
    pub items: Vec<ContentItem>,
    /// Strategy that produced the items
    pub strategy_used: Strategy,
    /// Page the items were extracted from
    pub source: String,
}

/// Whether a stream URL could be located
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamStatus {
    BypassSuccess,
    LockedOrNotFound,
}

/// Drama details shown with a stream
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    /// Drama title, "Unknown" when the page does not expose one
    pub title: String,
    /// Requested episode number
    pub episode: u32,
    /// Synopsis, empty when unavailable
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

/// Video endpoint payload
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub details: VideoDetails,
    /// Direct manifest URL, null when locked or missing
    pub stream_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub status: StreamStatus,
}

impl VideoResponse {
    /// Combine play-page details and manifest into the API shape
    pub fn from_play_page(episode: u32, details: PlayDetails, manifest: &ManifestResult) -> Self {
        let status = if manifest.is_found() {
            StreamStatus::BypassSuccess
        } else {
            StreamStatus::LockedOrNotFound
        };

        Self {
            details: VideoDetails {
                title: details.title.unwrap_or_else(|| "Unknown".to_string()),
                episode,
                description: details.description.unwrap_or_default(),
                poster: details.poster,
            },
            stream_url: manifest.url().map(str::to_string),
            media_type: manifest.media_type(),
            status,
        }
    }
}

/// Request body for extracting caller-supplied markup
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    /// Raw page markup
    pub markup: String,
    /// Absolute URL the markup was fetched from
    pub origin_url: String,
    /// "listing" or "play"
    pub page_kind: String,
}
