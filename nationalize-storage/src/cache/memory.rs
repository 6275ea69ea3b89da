//! Process-local cache backend.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use nationalize_core::CacheError;

use super::entry::CacheEntry;
use super::traits::{CacheBackend, CacheResult, CacheStats};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

/// In-memory cache backend with lazy expiry.
///
/// Expired entries are dropped when they are next read.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    inner: RwLock<Inner>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        let mut inner = self.inner.write().map_err(|_| CacheError::LockPoisoned)?;
        let now = Utc::now();

        let found = inner.entries.get(key).cloned();
        match found {
            Some(entry) if !entry.is_expired_at(now) => {
                inner.stats.hits += 1;
                Ok(Some(entry))
            }
            Some(_) => {
                inner.entries.remove(key);
                inner.stats.expirations += 1;
                inner.stats.misses += 1;
                Ok(None)
            }
            None => {
                inner.stats.misses += 1;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> CacheResult<()> {
        let entry = CacheEntry::new(value, Utc::now(), ttl);
        let mut inner = self.inner.write().map_err(|_| CacheError::LockPoisoned)?;
        inner.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut inner = self.inner.write().map_err(|_| CacheError::LockPoisoned)?;
        Ok(inner.entries.remove(key).is_some())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let inner = self.inner.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(CacheStats {
            entry_count: inner.entries.len() as u64,
            ..inner.stats.clone()
        })
    }
}
