//! Store configuration
//!
//! Defaults suit an interactive single-user app. Every knob can be overridden
//! through an environment variable so the CLI and tests can tune it without
//! code changes.

use chrono::Duration;

/// Default freshness window of an in-memory cache entry (milliseconds)
pub const DEFAULT_CACHE_FRESHNESS_MS: i64 = 5_000;

/// Default number of decoded values kept in the read cache
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Serialized records at or below this size are never compressed (bytes)
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1024;

/// Tuning for [`KeyedStore`](crate::storage::KeyedStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// A cached value older than this is treated as a miss.
    pub cache_freshness: Duration,
    /// Maximum number of cached keys (least recently used is evicted).
    pub cache_capacity: usize,
    /// Minimum serialized size before compression is attempted.
    pub compression_threshold: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_freshness: Duration::milliseconds(DEFAULT_CACHE_FRESHNESS_MS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
        }
    }
}

impl StoreConfig {
    /// Build a config from `STUDYMATE_*` environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let cache_freshness = lookup("STUDYMATE_CACHE_FRESHNESS_MS")
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|ms| *ms >= 0)
            .map(Duration::milliseconds)
            .unwrap_or(defaults.cache_freshness);

        let cache_capacity = lookup("STUDYMATE_CACHE_CAPACITY")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.cache_capacity);

        let compression_threshold = lookup("STUDYMATE_COMPRESSION_THRESHOLD")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.compression_threshold);

        Self {
            cache_freshness,
            cache_capacity,
            compression_threshold,
        }
    }

    /// Override the cache freshness window.
    pub fn with_cache_freshness(mut self, freshness: Duration) -> Self {
        self.cache_freshness = freshness;
        self
    }

    /// Override the compression threshold.
    pub fn with_compression_threshold(mut self, bytes: usize) -> Self {
        self.compression_threshold = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.cache_freshness, Duration::seconds(5));
        assert_eq!(config.cache_capacity, 256);
        assert_eq!(config.compression_threshold, 1024);
    }

    #[test]
    fn test_lookup_overrides_and_rejects_garbage() {
        let vars: HashMap<&str, &str> = [
            ("STUDYMATE_CACHE_FRESHNESS_MS", "250"),
            ("STUDYMATE_CACHE_CAPACITY", "0"),
            ("STUDYMATE_COMPRESSION_THRESHOLD", "lots"),
        ]
        .into_iter()
        .collect();

        let config = StoreConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.cache_freshness, Duration::milliseconds(250));
        // zero capacity would disable the LRU, so the default wins
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.compression_threshold, DEFAULT_COMPRESSION_THRESHOLD);
    }
}
