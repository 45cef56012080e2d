//! Error types for the variant cache

use std::fmt;

#[derive(Debug)]
pub enum CacheError {
    /// The payload for a new key does not name a blob under the cache root
    IncorrectPayload(String),
    /// The key cannot be used as a file name under the cache root
    InvalidKey(String),
    InvalidCapacity,
    Io(Box<std::io::Error>),
    /// Scanning the cache root at startup failed
    Reconcile(Box<std::io::Error>),
}

impl CacheError {
    /// True when the underlying filesystem error is `NotFound`
    pub fn is_not_found(&self) -> bool {
        match self {
            CacheError::Io(err) | CacheError::Reconcile(err) => {
                err.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::IncorrectPayload(key) => {
                write!(f, "Incorrect payload for key {}: expected a blob file name", key)
            }
            CacheError::InvalidKey(key) => write!(f, "Invalid cache key: {}", key),
            CacheError::InvalidCapacity => write!(f, "Cache capacity must be at least 1"),
            CacheError::Io(err) => write!(f, "Cache file error: {}", err),
            CacheError::Reconcile(err) => write!(f, "Cache directory scan failed: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io(err) | CacheError::Reconcile(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_incorrect_payload_display() {
        let err = CacheError::IncorrectPayload("abc".to_string());
        assert_eq!(
            format!("{}", err),
            "Incorrect payload for key abc: expected a blob file name"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        let err = CacheError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(err.source().is_some());
        assert!(format!("{}", err).contains("denied"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_detection() {
        let err = CacheError::from(io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());
        assert!(!CacheError::InvalidCapacity.is_not_found());
    }
}
