//! Drama Scraper API Library
//!
//! This library extracts short-drama listings and playable stream URLs from
//! upstream pages and exposes them through REST API endpoints. The
//! [`extractor`] module is pure and works on caller-supplied markup; the
//! [`scraper`] module only fetches.

pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod models;
pub mod routes;
pub mod scraper;
