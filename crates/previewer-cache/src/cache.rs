//! Capacity-bounded LRU index over blob files

use crate::error::{CacheError, Result};
use crate::list::{Handle, RecencyList};
use crate::store::BlobStore;
use crate::types::{AccessMode, BlobRef, CacheStats};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::File;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

struct Entry<V> {
    key: String,
    value: V,
}

/// Map and recency list, always mutated together under one lock
struct Inner<V> {
    items: HashMap<String, Handle>,
    queue: RecencyList<Entry<V>>,
}

/// An LRU cache whose entries are backed by files in a flat directory
pub struct BlobCache<V: BlobRef = String> {
    inner: Mutex<Inner<V>>,
    store: BlobStore,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: BlobRef> BlobCache<V> {
    /// Create a cache holding at most `capacity` blobs under `cache_dir`
    pub fn new(cache_dir: PathBuf, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity);
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                items: HashMap::new(),
                queue: RecencyList::new(),
            }),
            store: BlobStore::new(cache_dir),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Ensure the cache directory exists and adopt the blobs already in it.
    ///
    /// Blobs are adopted in directory enumeration order, so when more files
    /// than `capacity` are present the earliest-enumerated ones are evicted.
    /// Returns the number of entries indexed afterwards.
    pub async fn init(&self) -> Result<usize> {
        self.store.ensure_root().await?;

        let names = self.store.scan().await?;
        let found = names.len();
        for name in names {
            self.set(&name, V::from_blob_name(&name)).await?;
        }

        let entries = self.len().await;
        info!(cache_dir = ?self.store.root(), found, entries, "Cache initialized");
        Ok(entries)
    }

    pub fn get_dir(&self) -> &Path {
        self.store.root()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up `key`, promoting it to most-recently-used on a hit
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().await;

        let Some(&handle) = inner.items.get(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache miss");
            return None;
        };

        inner.queue.move_to_front(handle);
        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!(key, "Cache hit");
        inner.queue.get(handle).map(|entry| entry.value.clone())
    }

    /// Look up `key` without promoting it or counting the lookup
    pub async fn peek(&self, key: &str) -> Option<V> {
        let inner = self.inner.lock().await;
        let &handle = inner.items.get(key)?;
        inner.queue.get(handle).map(|entry| entry.value.clone())
    }

    /// Count a lookup that could not be served from the cache
    pub fn count_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Insert or refresh `key`, returning whether it was already present.
    ///
    /// A new key gets an empty backing blob unless a file of that name already
    /// exists. Inserting past capacity evicts the least-recently-used entry
    /// and deletes its blob.
    pub async fn set(&self, key: &str, value: V) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        self.set_locked(&mut inner, key, value).await
    }

    /// Write `data` as the blob for `key` and register it.
    ///
    /// The bytes are staged in a hidden file first and only renamed into place
    /// under the index lock, so a failed write never leaves an indexed entry
    /// behind and a concurrent eviction cannot delete the new blob before it is
    /// registered.
    pub async fn put(&self, key: &str, data: &[u8]) -> Result<bool> {
        let value = V::from_blob_name(key);
        let name = value
            .blob_name()
            .ok_or_else(|| CacheError::InvalidKey(key.to_string()))?
            .to_string();

        let staged = self.store.stage(&name, data).await?;

        let mut inner = self.inner.lock().await;
        self.store.commit(&staged, &name).await?;
        debug!(key, size = data.len(), "Stored blob");
        self.set_locked(&mut inner, key, value).await
    }

    /// Open the blob for `key` without touching recency
    pub async fn get_file(&self, key: &str, mode: AccessMode) -> Result<File> {
        self.store.open(key, mode).await
    }

    /// Whether a blob for `key` exists on disk, regardless of the index
    pub async fn has_file_path(&self, key: &str) -> bool {
        self.store.exists(key).await
    }

    /// Drop every entry and delete the cache directory
    pub async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.items.clear();
        inner.queue.clear();
        self.store.remove_all().await?;
        info!(cache_dir = ?self.store.root(), "Cache cleared");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.queue.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Keys from most- to least-recently-used
    pub async fn keys(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.queue.iter().map(|entry| entry.key.clone()).collect()
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.len().await;
        CacheStats {
            entries,
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    async fn set_locked(&self, inner: &mut Inner<V>, key: &str, value: V) -> Result<bool> {
        if value.blob_name().is_none() {
            return Err(CacheError::IncorrectPayload(key.to_string()));
        }

        if let Some(&handle) = inner.items.get(key) {
            if let Some(entry) = inner.queue.get_mut(handle) {
                entry.value = value;
            }
            inner.queue.move_to_front(handle);
            debug!(key, "Refreshed cache entry");
            return Ok(true);
        }

        if let Some(name) = value.blob_name() {
            self.store.create(name).await?;
        }

        let handle = inner.queue.push_front(Entry {
            key: key.to_string(),
            value,
        });
        inner.items.insert(key.to_string(), handle);
        debug!(key, entries = inner.queue.len(), "Inserted cache entry");

        if let Err(e) = self.evict_overflow(inner).await {
            self.rollback_insert(inner, key, handle).await;
            return Err(e);
        }
        Ok(false)
    }

    /// Undo an insert whose eviction failed, so the index stays within capacity
    async fn rollback_insert(&self, inner: &mut Inner<V>, key: &str, handle: Handle) {
        inner.items.remove(key);
        let Some(entry) = inner.queue.remove(handle) else {
            return;
        };
        if let Some(name) = entry.value.blob_name() {
            if let Err(e) = self.store.remove(name).await {
                warn!(blob = name, error = %e, "Failed to delete blob of rejected entry");
            }
        }
        debug!(key, "Rolled back cache entry");
    }

    /// Evict from the back until the index fits its capacity.
    ///
    /// An index record is dropped only once its blob is confirmed gone; if the
    /// delete fails the record stays and the caller rolls back its insert.
    async fn evict_overflow(&self, inner: &mut Inner<V>) -> Result<()> {
        while inner.queue.len() > self.capacity {
            let Some(back) = inner.queue.back() else {
                break;
            };

            if let Some(name) = inner.queue.get(back).and_then(|e| e.value.blob_name()) {
                if let Err(e) = self.store.remove(name).await {
                    warn!(blob = name, error = %e, "Failed to delete evicted blob");
                    return Err(e);
                }
            }

            if let Some(entry) = inner.queue.remove(back) {
                inner.items.remove(&entry.key);
                debug!(key = %entry.key, "Evicted least recently used entry");
            }
        }
        Ok(())
    }
}
