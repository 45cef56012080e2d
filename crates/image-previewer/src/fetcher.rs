//! Fetching source images from upstream servers

use crate::error::{PreviewerError, Result};
use reqwest::header::{self, HeaderMap, HeaderName};
use reqwest::Client;
use tracing::{debug, warn};

/// HTTP client for fetching source images
pub struct ImageFetcher {
    client: Client,
    max_file_size: u64,
}

impl ImageFetcher {
    /// Create a fetcher that rejects bodies larger than `max_file_size` bytes
    pub fn new(max_file_size: u64) -> Self {
        Self {
            client: Client::new(),
            max_file_size,
        }
    }

    /// Fetch `url`, forwarding the client's request headers
    pub async fn fetch(&self, url: &str, client_headers: &HeaderMap) -> Result<Vec<u8>> {
        debug!(url = %url, "Fetching source image");

        let mut response = self
            .client
            .get(url)
            .headers(forwarded_headers(client_headers))
            .send()
            .await?;

        let status = response.status();
        debug!(url = %url, status = %status, "Upstream responded");
        if status.as_u16() >= 400 {
            warn!(url = %url, status = %status, "Upstream rejected request");
            return Err(PreviewerError::Upstream {
                status: status.as_u16(),
                reason: status.to_string(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_file_size)
        {
            return Err(PreviewerError::TooLarge(self.max_file_size));
        }

        let mut data = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (data.len() + chunk.len()) as u64 > self.max_file_size {
                return Err(PreviewerError::TooLarge(self.max_file_size));
            }
            data.extend_from_slice(&chunk);
        }

        debug!(url = %url, size = data.len(), "Fetched source image");
        Ok(data)
    }
}

/// Client headers minus those describing the client connection rather than the request
fn forwarded_headers(client_headers: &HeaderMap) -> HeaderMap {
    let mut headers = client_headers.clone();
    let skipped: [HeaderName; 9] = [
        header::HOST,
        header::CONNECTION,
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
        header::TE,
        header::TRAILER,
        header::PROXY_AUTHORIZATION,
        // The body is decoded as-is, so it must not arrive compressed
        header::ACCEPT_ENCODING,
    ];
    for name in skipped {
        headers.remove(name);
    }
    headers
}
