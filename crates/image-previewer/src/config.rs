use std::env;
use std::path::PathBuf;

/// Service configuration parsed from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewerConfig {
    pub host: String,
    pub port: u16,
    pub cache_dir: PathBuf,
    /// Maximum number of cached variants
    pub cache_size: usize,
    /// Maximum accepted upstream body, in bytes
    pub max_file_size: u64,
    /// Largest accepted width or height of a requested variant
    pub max_dimension: u32,
}

impl Default for PreviewerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            cache_dir: PathBuf::from(".cache"),
            cache_size: 10,
            max_file_size: 5 * 1024 * 1024, // 5MB
            max_dimension: 4096,
        }
    }
}

impl PreviewerConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from `lookup`; unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let cache_dir = lookup("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let cache_size = lookup("CACHE_SIZE")
            .and_then(|s| s.parse().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.cache_size);

        let max_file_size = lookup("MAX_FILE_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_file_size);

        let max_dimension = lookup("MAX_DIMENSION")
            .and_then(|s| s.parse().ok())
            .filter(|max| *max > 0)
            .unwrap_or(defaults.max_dimension);

        Self {
            host,
            port,
            cache_dir,
            cache_size,
            max_file_size,
            max_dimension,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PreviewerConfig::default();
        assert_eq!(config.port, 8082);
        assert_eq!(config.cache_dir, PathBuf::from(".cache"));
        assert_eq!(config.cache_size, 10);
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.max_dimension, 4096);
        assert_eq!(config.bind_addr(), "0.0.0.0:8082");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("CACHE_DIR", "/var/cache/previewer"),
            ("CACHE_SIZE", "250"),
            ("MAX_FILE_SIZE", "1024"),
            ("MAX_DIMENSION", "800"),
        ]
        .into_iter()
        .collect();

        let config = PreviewerConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/previewer"));
        assert_eq!(config.cache_size, 250);
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.max_dimension, 800);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "not-a-port"),
            ("CACHE_SIZE", "0"),
            ("MAX_DIMENSION", "0"),
        ]
        .into_iter()
        .collect();

        let config = PreviewerConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config, PreviewerConfig::default());
    }
}
