//! HTTP server for the previewer
//!
//! Provides /health-check and /fill/{width}/{height}/{*external_url}.

use crate::error::PreviewerError;
use crate::params::FillParams;
use crate::pipeline::Previewer;
use crate::types::HealthResponse;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

/// Shared state for the HTTP server
pub struct ServerState {
    pub previewer: Previewer,
    /// Largest accepted width or height
    pub max_dimension: u32,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(previewer: Previewer, max_dimension: u32) -> Self {
        Self {
            previewer,
            max_dimension,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health-check", get(health))
        .route("/fill/{width}/{height}/{*external_url}", get(fill))
        .fallback(fallback)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, addr: &str) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting HTTP server on {}", listener.local_addr()?);

    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.previewer.cache().stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}

/// Serve `external_url` resized to fill `width`x`height`
async fn fill(
    State(state): State<SharedState>,
    Path((width, height, external_url)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, PreviewerError> {
    let params = FillParams::parse(&width, &height, &external_url, state.max_dimension)?;
    let preview = state.previewer.preview(&params, &headers).await?;

    let cache_header = if preview.from_cache { "HIT" } else { "MISS" };
    debug!(url = %params.external_url, cache = cache_header, "Serving preview");

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, preview.content_type)
        .header(header::CONTENT_LENGTH, preview.data.len())
        .header("X-Cache", cache_header)
        .body(Body::from(preview.data))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()))
}

/// Malformed fill paths are a client error; anything else is unknown
async fn fallback(uri: Uri) -> Response {
    if uri.path().starts_with("/fill/") || uri.path() == "/fill" {
        return PreviewerError::InvalidUri(uri.path().to_string()).into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
