//! Error types for the image previewer

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum PreviewerError {
    InvalidUri(String),
    /// The upstream could not be reached
    Fetch(Box<reqwest::Error>),
    /// The upstream answered with a status >= 400
    Upstream { status: u16, reason: String },
    TooLarge(u64),
    UnsupportedFileType,
    Image(Box<image::ImageError>),
    Cache(previewer_cache::CacheError),
    Io(Box<std::io::Error>),
    Task(String),
    Config(String),
}

impl PreviewerError {
    pub const INVALID_URI: &'static str =
        "invalid URI. Expected format is: /fill/<width>/<height>/<external url>";
    pub const UNSUPPORTED_FILE_TYPE: &'static str =
        "file type is not supported. Supported file types: jpeg, png, gif";

    /// Status code and client-facing message
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            PreviewerError::InvalidUri(_) => (StatusCode::BAD_REQUEST, Self::INVALID_URI.into()),
            PreviewerError::Fetch(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            PreviewerError::Upstream { status, reason } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                reason.clone(),
            ),
            PreviewerError::TooLarge(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            PreviewerError::UnsupportedFileType => {
                (StatusCode::BAD_REQUEST, Self::UNSUPPORTED_FILE_TYPE.into())
            }
            PreviewerError::Image(_) => (StatusCode::BAD_REQUEST, "resize problem occurred".into()),
            PreviewerError::Cache(_)
            | PreviewerError::Io(_)
            | PreviewerError::Task(_)
            | PreviewerError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ),
        }
    }
}

impl fmt::Display for PreviewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewerError::InvalidUri(msg) => write!(f, "Invalid URI: {}", msg),
            PreviewerError::Fetch(err) => write!(f, "Fetch error: {}", err),
            PreviewerError::Upstream { status, reason } => {
                write!(f, "Upstream returned status {}: {}", status, reason)
            }
            PreviewerError::TooLarge(limit) => {
                write!(f, "Upstream image exceeds {} bytes", limit)
            }
            PreviewerError::UnsupportedFileType => f.write_str(Self::UNSUPPORTED_FILE_TYPE),
            PreviewerError::Image(err) => write!(f, "Image error: {}", err),
            PreviewerError::Cache(err) => write!(f, "Cache error: {}", err),
            PreviewerError::Io(err) => write!(f, "IO error: {}", err),
            PreviewerError::Task(msg) => write!(f, "Resize task failed: {}", msg),
            PreviewerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for PreviewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreviewerError::Fetch(err) => Some(err.as_ref()),
            PreviewerError::Image(err) => Some(err.as_ref()),
            PreviewerError::Cache(err) => Some(err),
            PreviewerError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for PreviewerError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<reqwest::Error> for PreviewerError {
    fn from(err: reqwest::Error) -> Self {
        PreviewerError::Fetch(Box::new(err))
    }
}

impl From<image::ImageError> for PreviewerError {
    fn from(err: image::ImageError) -> Self {
        PreviewerError::Image(Box::new(err))
    }
}

impl From<previewer_cache::CacheError> for PreviewerError {
    fn from(err: previewer_cache::CacheError) -> Self {
        PreviewerError::Cache(err)
    }
}

impl From<std::io::Error> for PreviewerError {
    fn from(err: std::io::Error) -> Self {
        PreviewerError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for PreviewerError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        PreviewerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PreviewerError>;
