//! Disk-backed, capacity-bounded LRU cache for resized image variants
//!
//! Every entry in the in-memory index is backed by a blob file named after its
//! cache key in a flat root directory. Eviction removes the least-recently-used
//! entry together with its blob, and startup reconciliation adopts blobs left
//! on disk by a previous process.

mod cache;
mod error;
mod key;
mod list;
mod store;
mod types;

pub use cache::BlobCache;
pub use error::{CacheError, Result};
pub use key::CacheKey;
pub use list::{Handle, RecencyList};
pub use types::{AccessMode, BlobRef, CacheStats};
