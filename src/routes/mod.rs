//! API Routes module for the Drama Scraper API
//!
//! This module contains all HTTP route handlers for the public API endpoints.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{error, info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::config::Config;
use crate::constants::endpoints;
use crate::error::AppResult;
use crate::extractor::{
    extract, extract_listing, extract_play, manifest::classify_network_request, parse_episode,
    require_id, ContentItem, ExtractionResult, ManifestResult, MediaType, PageExtraction,
    PageKind, PlayDetails, PlayPageResult, RawPage, Strategy,
};
use crate::models::{
    ApiError, ApiResponse, ExtractRequest, StreamStatus, TrendingResponse, VideoDetails,
    VideoResponse,
};
use crate::scraper::{Scraper, ScraperResult};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
}

/// Fetch an upstream page with this deployment's client settings
async fn fetch(config: &Config, url: &str) -> AppResult<ScraperResult> {
    info!("Fetching URL: {}", url);
    let scraper = Scraper::with_config(config.scraper())?;
    let result = scraper.fetch_page(url).await.map_err(|e| {
        error!("Failed to fetch {}: {}", url, e);
        e
    })?;
    info!("Fetched {} bytes of HTML", result.html.len());
    Ok(result)
}

/// GET /api/trending - Get trending dramas from the home page
#[utoipa::path(
    get,
    path = "/api/trending",
    tag = "drama",
    responses(
        (status = 200, description = "Trending dramas extracted (may be empty)", body = TrendingResponse),
        (status = 502, description = "Upstream site unreachable", body = ApiError)
    )
)]
pub async fn get_trending(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let url = endpoints::home(&data.config.base_url);
    let fetched = fetch(&data.config, &url).await?;

    let page = RawPage::new(&fetched.html, &fetched.final_url, PageKind::Listing)?;
    let result = extract_listing(&page, &data.config.extractor());
    info!(
        "Extracted {} trending items via {:?}",
        result.items.len(),
        result.strategy_used
    );
    if result.items.is_empty() {
        warn!("No trending items found on {}", url);
    }

    Ok(HttpResponse::Ok().json(ApiResponse::new(TrendingResponse {
        items: result.items,
        strategy_used: result.strategy_used,
        source: url,
    })))
}

/// Query parameters for the video endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VideoQuery {
    /// Drama id (required)
    pub id: Option<String>,
    /// Episode number (default: 1)
    pub ep: Option<String>,
}

/// GET /api/video - Get drama info and the direct stream URL for an episode
///
/// A missing stream is reported as `LOCKED_OR_NOT_FOUND`, not as an error.
#[utoipa::path(
    get,
    path = "/api/video",
    tag = "drama",
    params(VideoQuery),
    responses(
        (status = 200, description = "Play page processed", body = VideoResponse),
        (status = 400, description = "Bad request - drama id is required", body = ApiError),
        (status = 404, description = "Drama not found upstream", body = ApiError),
        (status = 502, description = "Upstream site unreachable", body = ApiError)
    )
)]
pub async fn get_video(
    data: web::Data<AppState>,
    query: web::Query<VideoQuery>,
) -> AppResult<HttpResponse> {
    let id = require_id(query.id.as_deref())?;
    let episode = parse_episode(query.ep.as_deref())?;

    let url = endpoints::play(&data.config.base_url, id, episode);
    let fetched = fetch(&data.config, &url).await?;

    let page = RawPage::new(&fetched.html, &fetched.final_url, PageKind::Play)?;
    let result = extract_play(&page, &data.config.extractor());
    let response = VideoResponse::from_play_page(episode, result.details, &result.manifest);
    info!("Drama {} episode {}: {:?}", id, episode, response.status);

    Ok(HttpResponse::Ok().json(ApiResponse::new(response)))
}

/// POST /api/extract - Run the extractor on caller-supplied markup
///
/// No upstream request is made.
#[utoipa::path(
    post,
    path = "/api/extract",
    tag = "extractor",
    request_body = ExtractRequest,
    responses(
        (status = 200, description = "Extraction result tagged by page kind", body = PageExtraction),
        (status = 400, description = "Invalid page kind or origin URL", body = ApiError)
    )
)]
pub async fn post_extract(
    data: web::Data<AppState>,
    body: web::Json<ExtractRequest>,
) -> AppResult<HttpResponse> {
    let kind: PageKind = body.page_kind.parse()?;
    let page = RawPage::new(&body.markup, &body.origin_url, kind)?;
    let result = extract(&page, &data.config.extractor());

    Ok(HttpResponse::Ok().json(ApiResponse::new(result)))
}

/// Request body for classifying a captured network request
#[derive(Debug, Deserialize, ToSchema)]
pub struct NetworkEventRequest {
    /// URL of the intercepted request
    pub url: String,
}

/// POST /api/network-event - Classify a URL captured by a headless browser
#[utoipa::path(
    post,
    path = "/api/network-event",
    tag = "extractor",
    request_body = NetworkEventRequest,
    responses(
        (status = 200, description = "Manifest classification (found=false when not a manifest)", body = ManifestResult)
    )
)]
pub async fn post_network_event(
    data: web::Data<AppState>,
    body: web::Json<NetworkEventRequest>,
) -> HttpResponse {
    let result = classify_network_request(body.url.trim(), &data.config.extractor())
        .unwrap_or_else(ManifestResult::not_found);

    HttpResponse::Ok().json(ApiResponse::new(result))
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Drama Scraper API",
        version = "0.1.0",
        description = "Extracts short-drama listings and playable stream URLs from upstream pages",
        license(
            name = "MIT"
        )
    ),
    paths(
        get_trending,
        get_video,
        post_extract,
        post_network_event
    ),
    components(
        schemas(
            ContentItem,
            ExtractionResult,
            Strategy,
            ManifestResult,
            MediaType,
            PlayDetails,
            PlayPageResult,
            PageExtraction,
            PageKind,
            TrendingResponse,
            VideoResponse,
            VideoDetails,
            StreamStatus,
            ExtractRequest,
            NetworkEventRequest,
            VideoQuery,
            ApiError
        )
    ),
    tags(
        (name = "drama", description = "Upstream drama data endpoints"),
        (name = "extractor", description = "Offline extraction of supplied content")
    )
)]
pub struct ApiDoc;

/// Configure API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/trending", web::get().to(get_trending))
            .route("/video", web::get().to(get_video))
            .route("/extract", web::post().to(post_extract))
            .route("/network-event", web::post().to(post_network_event)),
    );
}
