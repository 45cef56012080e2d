//! Core types for the image previewer

use previewer_cache::CacheStats;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

/// A resized image ready to be served
#[derive(Debug)]
pub struct Preview {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub from_cache: bool,
}
