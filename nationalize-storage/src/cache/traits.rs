//! Cache backend trait.

use std::time::Duration;

use async_trait::async_trait;
use nationalize_core::CacheError;

use super::entry::CacheEntry;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache backend trait for pluggable cache implementations.
///
/// Keys are plain strings and values are JSON documents. Implementations
/// must never return an entry whose TTL has elapsed, and must treat deleting
/// a missing key as a no-op.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Get a live entry, or None if missing or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>>;

    /// Store a value that expires after `ttl`, replacing any previous entry.
    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> CacheResult<()>;

    /// Remove an entry. Returns whether an entry was present.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Get cache statistics.
    async fn stats(&self) -> CacheResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (including expired entries).
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of entries dropped because their TTL elapsed.
    pub expirations: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
