//! Typed cache of person records keyed by name.

use std::sync::Arc;
use std::time::Duration;

use nationalize_core::{CacheError, PersonRecord, CACHE_TTL};

use super::traits::{CacheBackend, CacheResult};

/// Person-record view over a [`CacheBackend`].
///
/// The key is the exact, case-sensitive name. The value is the full record.
#[derive(Clone)]
pub struct PersonCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl std::fmt::Debug for PersonCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonCache")
            .field("backend", &self.backend.backend_name())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl PersonCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Cache with the standard one hour TTL.
    pub fn with_default_ttl(backend: Arc<dyn CacheBackend>) -> Self {
        Self::new(backend, CACHE_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Look up a live record.
    ///
    /// An entry that no longer decodes as a record is evicted and reported
    /// as a miss. So is a record stored under a different name, which a
    /// backend that digests long keys could in principle return.
    pub async fn get(&self, name: &str) -> CacheResult<Option<PersonRecord>> {
        let Some(entry) = self.backend.get(name).await? else {
            return Ok(None);
        };
        match serde_json::from_value::<PersonRecord>(entry.value) {
            Ok(record) if record.name == name => Ok(Some(record)),
            Ok(record) => {
                tracing::warn!(name, cached = %record.name, "Evicting cache entry for another name");
                self.backend.delete(name).await?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "Evicting undecodable cache entry");
                self.backend.delete(name).await?;
                Ok(None)
            }
        }
    }

    /// Store `record` under its name for the configured TTL.
    pub async fn put(&self, record: &PersonRecord) -> CacheResult<()> {
        let value = serde_json::to_value(record).map_err(|e| CacheError::Serialization {
            key: record.name.clone(),
            reason: e.to_string(),
        })?;
        self.backend.set(&record.name, value, self.ttl).await
    }

    /// Remove the entry for `name`. Missing entries are not an error.
    pub async fn evict(&self, name: &str) -> CacheResult<()> {
        self.backend.delete(name).await.map(|_| ())
    }

    /// Evict then store, so a failed put never leaves the old value behind.
    pub async fn refresh(&self, record: &PersonRecord) -> CacheResult<()> {
        self.evict(&record.name).await?;
        self.put(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCacheBackend;
    use nationalize_core::CountryProbability;
    use serde_json::json;

    fn vadim() -> PersonRecord {
        PersonRecord::new("Vadim", 1, vec![CountryProbability::new("RU", 0.8)])
    }

    fn cache() -> (PersonCache, Arc<InMemoryCacheBackend>) {
        let backend = Arc::new(InMemoryCacheBackend::new());
        (PersonCache::with_default_ttl(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_put_get_evict() -> CacheResult<()> {
        let (cache, _) = cache();
        cache.put(&vadim()).await?;
        assert_eq!(cache.get("Vadim").await?, Some(vadim()));

        cache.evict("Vadim").await?;
        assert_eq!(cache.get("Vadim").await?, None);
        cache.evict("Vadim").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_default_ttl_is_one_hour() {
        let (cache, _) = cache();
        assert_eq!(cache.ttl(), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_refresh_replaces_value() -> CacheResult<()> {
        let (cache, _) = cache();
        cache.put(&vadim()).await?;

        let mut updated = vadim();
        updated.count = 9;
        cache.refresh(&updated).await?;
        assert_eq!(cache.get("Vadim").await?.map(|p| p.count), Some(9));
        Ok(())
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_evicted_as_miss() -> CacheResult<()> {
        let (cache, backend) = cache();
        backend
            .set("Vadim", json!({"unexpected": true}), cache.ttl())
            .await?;

        assert_eq!(cache.get("Vadim").await?, None);
        assert!(backend.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_entry_for_another_name_is_a_miss() -> CacheResult<()> {
        let (cache, backend) = cache();
        let value = serde_json::to_value(vadim()).expect("record should serialize");
        backend.set("Olga", value, cache.ttl()).await?;

        assert_eq!(cache.get("Olga").await?, None);
        assert!(backend.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_lmdb_round_trips_longest_multibyte_name() -> CacheResult<()> {
        let dir = tempfile::TempDir::new().expect("TempDir creation should succeed");
        let backend = crate::cache::LmdbCacheBackend::new(dir.path(), 10)?;
        let cache = PersonCache::with_default_ttl(Arc::new(backend));

        let name = "語".repeat(255);
        nationalize_core::validate_name(&name).expect("255 characters is a valid name");
        let record = PersonRecord::new(name.clone(), 3, vec![CountryProbability::new("JP", 0.9)]);

        cache.put(&record).await?;
        assert_eq!(cache.get(&name).await?, Some(record.clone()));

        cache.refresh(&record).await?;
        cache.evict(&name).await?;
        assert_eq!(cache.get(&name).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_ttl_never_hits() -> CacheResult<()> {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let cache = PersonCache::new(backend, Duration::ZERO);
        cache.put(&vadim()).await?;
        assert_eq!(cache.get("Vadim").await?, None);
        Ok(())
    }
}
