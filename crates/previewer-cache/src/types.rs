//! Cache types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A cache payload that refers to a blob file under the cache root.
///
/// Reconciliation rebuilds payloads from file names, so every implementation
/// must be constructible from the name it reports.
pub trait BlobRef: Clone + Send + Sync + 'static {
    /// The blob's file name, or `None` when the value does not denote a blob
    fn blob_name(&self) -> Option<&str>;

    fn from_blob_name(name: &str) -> Self;
}

impl BlobRef for String {
    fn blob_name(&self) -> Option<&str> {
        is_blob_name(self).then_some(self.as_str())
    }

    fn from_blob_name(name: &str) -> Self {
        name.to_string()
    }
}

impl BlobRef for PathBuf {
    fn blob_name(&self) -> Option<&str> {
        self.file_name()
            .and_then(|name| name.to_str())
            .filter(|name| is_blob_name(name))
    }

    fn from_blob_name(name: &str) -> Self {
        PathBuf::from(name)
    }
}

/// A plain, non-hidden file name with no path separators.
///
/// Dot-prefixed names are reserved for staging files and are never indexed.
pub(crate) fn is_blob_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}

/// How [`crate::BlobCache::get_file`] opens a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    /// Write-only, appending to the existing blob
    Append,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.capacity, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_cache_stats_serialization() {
        let stats = CacheStats {
            entries: 3,
            capacity: 10,
            hits: 42,
            misses: 7,
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"capacity\":10"));

        let deserialized: CacheStats = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.entries, 3);
        assert_eq!(deserialized.hits, 42);
    }

    #[test]
    fn test_string_blob_name() {
        assert_eq!("abc123".to_string().blob_name(), Some("abc123"));
        assert_eq!(String::new().blob_name(), None);
        assert_eq!("../etc/passwd".to_string().blob_name(), None);
        assert_eq!("nested/name".to_string().blob_name(), None);
        assert_eq!(".tmp-abc".to_string().blob_name(), None);
    }

    #[test]
    fn test_path_blob_name_uses_file_name() {
        let path = PathBuf::from(".cache/abc123");
        assert_eq!(path.blob_name(), Some("abc123"));
        assert_eq!(PathBuf::from("/").blob_name(), None);
        assert_eq!(PathBuf::from_blob_name("abc123"), PathBuf::from("abc123"));
    }
}
