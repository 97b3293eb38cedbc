//! Global error handling module for the Drama Scraper API
//!
//! This module provides a unified error type that handles all application errors
//! and converts them to appropriate HTTP responses with consistent JSON structure.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::extractor::ExtractError;
use crate::models::ApiError;
use crate::scraper::ScraperError;

/// Application-wide error type that unifies all error sources
#[derive(Debug, Error)]
pub enum AppError {
    /// Upstream fetch errors (network, HTTP, body)
    #[error("Scraping error: {0}")]
    Scraping(#[from] ScraperError),

    /// Caller input rejected by the extractor
    #[error("Invalid input: {0}")]
    Extraction(#[from] ExtractError),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Extraction(_) => StatusCode::BAD_REQUEST,

            // Upstream answered but not usefully
            AppError::Scraping(ScraperError::HttpError(404)) => StatusCode::NOT_FOUND,
            AppError::Scraping(ScraperError::RateLimited) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Scraping(ScraperError::ClientBuild(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Scraping(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Extraction(err) => err.to_string(),

            AppError::Scraping(scraper_err) => match scraper_err {
                ScraperError::NetworkError(msg) => format!("Failed to connect to server: {}", msg),
                ScraperError::HttpError(404) => "Drama not found upstream".to_string(),
                ScraperError::HttpError(status) => {
                    format!("Server returned error status: {}", status)
                }
                ScraperError::ResponseError(msg) => format!("Failed to read response: {}", msg),
                ScraperError::RateLimited => {
                    "Server is rate limiting requests, please try again later".to_string()
                }
                ScraperError::ClientBuild(_) => "HTTP client unavailable".to_string(),
            },
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_response = ApiError::new(self.user_message());

        HttpResponse::build(status).json(error_response)
    }
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_is_bad_request() {
        let error: AppError = ExtractError::MissingIdentifier("Drama ID").into();
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.user_message(), "Drama ID is required");
    }

    #[test]
    fn test_invalid_origin_is_bad_request() {
        let error: AppError = ExtractError::InvalidOrigin {
            url: "/detail/1".to_string(),
            reason: "relative URL without a base".to_string(),
        }
        .into();
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.user_message().contains("/detail/1"));
    }

    #[test]
    fn test_client_build_is_internal_error() {
        let error = AppError::Scraping(ScraperError::ClientBuild("tls".to_string()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.user_message(), "HTTP client unavailable");
    }

    #[test]
    fn test_scraper_error_status_codes() {
        let error = AppError::Scraping(ScraperError::NetworkError("timeout".to_string()));
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);

        let error = AppError::Scraping(ScraperError::HttpError(503));
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);

        let error = AppError::Scraping(ScraperError::HttpError(404));
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);

        let error = AppError::Scraping(ScraperError::RateLimited);
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_scraper_error_user_messages() {
        let error =
            AppError::Scraping(ScraperError::NetworkError("connection refused".to_string()));
        assert!(error.user_message().contains("Failed to connect"));

        let error = AppError::Scraping(ScraperError::HttpError(500));
        assert!(error.user_message().contains("500"));

        let error = AppError::Scraping(ScraperError::RateLimited);
        assert!(error.user_message().contains("rate limiting"));
    }

    #[test]
    fn test_error_display() {
        let error: AppError = ExtractError::InvalidEpisode("0".to_string()).into();
        assert_eq!(
            format!("{}", error),
            "Invalid input: Invalid episode number '0', expected a positive integer"
        );

        let error = AppError::Scraping(ScraperError::RateLimited);
        assert_eq!(format!("{}", error), "Scraping error: Rate limited by upstream");
    }

    #[test]
    fn test_from_scraper_error() {
        let scraper_err = ScraperError::NetworkError("timeout".to_string());
        let app_err: AppError = scraper_err.into();
        assert!(matches!(app_err, AppError::Scraping(_)));
    }
}
