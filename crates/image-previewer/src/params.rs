//! Validation of `/fill/{width}/{height}/{*external_url}` path segments

use crate::error::{PreviewerError, Result};
use previewer_cache::CacheKey;

/// A validated fill request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillParams {
    pub width: u32,
    pub height: u32,
    /// Source location without scheme, e.g. `example.com/images/owl.jpg`
    pub external_url: String,
}

impl FillParams {
    /// Validate the path segments; each dimension must lie in `1..=max_dimension`
    pub fn parse(
        width: &str,
        height: &str,
        external_url: &str,
        max_dimension: u32,
    ) -> Result<Self> {
        let width = parse_dimension("width", width, max_dimension)?;
        let height = parse_dimension("height", height, max_dimension)?;

        let external_url = external_url.trim_start_matches('/');
        if external_url.is_empty() {
            return Err(PreviewerError::InvalidUri("missing external url".into()));
        }

        Ok(Self {
            width,
            height,
            external_url: external_url.to_string(),
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(&self.external_url, self.width, self.height)
    }

    /// Upstream URL; sources are always fetched over plain http
    pub fn source_url(&self) -> String {
        format!("http://{}", self.external_url)
    }
}

fn parse_dimension(name: &str, value: &str, max: u32) -> Result<u32> {
    // Digits only: `u32::from_str` would also accept a leading '+'
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PreviewerError::InvalidUri(format!("{} is not a number", name)));
    }
    match value.parse::<u32>() {
        Ok(0) => Err(PreviewerError::InvalidUri(format!("{} must be positive", name))),
        Ok(n) if n > max => Err(PreviewerError::InvalidUri(format!(
            "{} exceeds {}",
            name, max
        ))),
        Ok(n) => Ok(n),
        Err(_) => Err(PreviewerError::InvalidUri(format!("{} is out of range", name))),
    }
}
