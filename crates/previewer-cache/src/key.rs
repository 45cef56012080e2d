//! Cache key derivation

use sha2::{Digest, Sha512};
use std::fmt;

/// Fixed-length identifier of one resized variant, used verbatim as its blob file name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Number of hex characters in a key
    pub const LEN: usize = 64;

    /// Derive the key for `source_url` resized to `width`x`height`
    pub fn derive(source_url: &str, width: u32, height: u32) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(format!("{}/{}x{}", source_url, width, height).as_bytes());
        let mut digest = hex::encode(hasher.finalize());
        digest.truncate(Self::LEN);
        Self(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_generation() {
        let key1 = CacheKey::derive("example.com/images/owl.jpg", 300, 200);
        let key2 = CacheKey::derive("example.com/images/owl.jpg", 300, 200);
        let key3 = CacheKey::derive("example.com/images/owl.jpg", 200, 300);

        // Same inputs produce same key
        assert_eq!(key1, key2);

        // Swapped dimensions are a different variant
        assert_ne!(key1, key3);

        assert_eq!(key1.as_str().len(), CacheKey::LEN);
        assert!(key1
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_cache_key_is_truncated_sha512() {
        let key = CacheKey::derive("example.com/images/owl.jpg", 300, 200);
        assert_eq!(
            key.to_string(),
            "299c3b975b3f2bd23f18df2991d0eb13572a39741fb40a21e439be9fd2ce95b0"
        );
    }
}
