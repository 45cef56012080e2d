//! Image Previewer - resizing proxy with an LRU cache of produced variants
//!
//! Fetches a source image over HTTP, scales and crops it to the requested
//! dimensions, and keeps the result on disk for subsequent requests.

mod config;
mod error;
mod fetcher;
mod params;
mod pipeline;
mod resizer;
mod server;
mod types;

use crate::config::PreviewerConfig;
use crate::error::{PreviewerError, Result};
use crate::fetcher::ImageFetcher;
use crate::pipeline::Previewer;
use crate::server::{start_server, ServerState, SharedState};
use previewer_cache::BlobCache;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env().add_directive("image_previewer=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Image Previewer...");

    let config = PreviewerConfig::from_env();
    info!("Listen address: {}", config.bind_addr());
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Cache size: {} variants", config.cache_size);
    info!("Max file size: {} bytes", config.max_file_size);
    info!("Max dimension: {} px", config.max_dimension);

    let cache = BlobCache::new(config.cache_dir.clone(), config.cache_size)?;
    let adopted = cache.init().await?;
    info!("Adopted {} cached variants", adopted);

    let fetcher = ImageFetcher::new(config.max_file_size);
    let state: SharedState = Arc::new(ServerState::new(
        Previewer::new(cache, fetcher),
        config.max_dimension,
    ));

    start_server(state, &config.bind_addr())
        .await
        .map_err(|e| PreviewerError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
