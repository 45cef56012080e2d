//! Fetch, resize, cache and serve

use crate::error::{PreviewerError, Result};
use crate::fetcher::ImageFetcher;
use crate::params::FillParams;
use crate::resizer;
use crate::types::Preview;
use previewer_cache::{AccessMode, BlobCache};
use reqwest::header::HeaderMap;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Produces resized variants, reusing cached blobs where possible
pub struct Previewer {
    cache: BlobCache,
    fetcher: ImageFetcher,
}

impl Previewer {
    pub fn new(cache: BlobCache, fetcher: ImageFetcher) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &BlobCache {
        &self.cache
    }

    /// Serve the variant described by `params`, producing it on a miss
    pub async fn preview(
        &self,
        params: &FillParams,
        client_headers: &HeaderMap,
    ) -> Result<Preview> {
        let key = params.cache_key();
        debug!(key = %key, url = %params.external_url, "Checking cache");

        if let Some(preview) = self.cached(key.as_str()).await? {
            return Ok(preview);
        }

        let source = self
            .fetcher
            .fetch(&params.source_url(), client_headers)
            .await?;

        let (width, height) = (params.width, params.height);
        let (data, kind) =
            tokio::task::spawn_blocking(move || resizer::fill(&source, width, height))
                .await
                .map_err(|e| PreviewerError::Task(e.to_string()))??;

        // Only encoded variants reach the cache
        self.cache.put(key.as_str(), &data).await?;
        info!(
            key = %key,
            url = %params.external_url,
            width,
            height,
            size = data.len(),
            "Stored new variant"
        );

        Ok(Preview {
            data,
            content_type: kind.mime_type(),
            from_cache: false,
        })
    }

    /// Read a cached blob, or `None` when the variant must be produced.
    ///
    /// The entry is promoted and counted as a hit only once its blob was read.
    async fn cached(&self, key: &str) -> Result<Option<Preview>> {
        let Some(data) = self.read_blob(key).await? else {
            self.cache.count_miss();
            return Ok(None);
        };

        self.cache.get(key).await;
        Ok(Some(Preview {
            content_type: resizer::content_type(&data),
            data,
            from_cache: true,
        }))
    }

    async fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.cache.peek(key).await.is_none() || !self.cache.has_file_path(key).await {
            return Ok(None);
        }

        let mut file = match self.cache.get_file(key, AccessMode::Read).await {
            Ok(file) => file,
            // Evicted between the lookup and the open
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;
        if data.is_empty() {
            debug!(key, "Cached blob is empty, producing it again");
            return Ok(None);
        }
        Ok(Some(data))
    }
}
