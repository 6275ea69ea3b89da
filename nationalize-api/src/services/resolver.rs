//! Resolver
//!
//! Read path: cache, then store, then the nationality API.

use std::sync::Arc;

use nationalize_core::{
    NationalityProvider, NationalizeResult, PersonRecord, ValidationError,
};
use nationalize_storage::{PersonCache, PersonStore};

use super::{observe_cache, observe_cache_lookup};
use crate::telemetry::metrics::with_metrics;

/// Which tier served a read.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Cached(PersonRecord),
    Stored(PersonRecord),
    External(PersonRecord),
}

impl Resolution {
    /// Tier name, used for the `x-nationalize-source` header and metrics.
    pub fn source(&self) -> &'static str {
        match self {
            Resolution::Cached(_) => "cache",
            Resolution::Stored(_) => "store",
            Resolution::External(_) => "external",
        }
    }

    pub fn record(&self) -> &PersonRecord {
        match self {
            Resolution::Cached(r) | Resolution::Stored(r) | Resolution::External(r) => r,
        }
    }

    pub fn into_record(self) -> PersonRecord {
        match self {
            Resolution::Cached(r) | Resolution::Stored(r) | Resolution::External(r) => r,
        }
    }
}

/// Resolves a name through the cache, the store and the upstream API.
///
/// Exactly one tier serves each read and the upstream is called at most
/// once. A store hit is written back to the cache. Upstream results are
/// returned as-is and are neither cached nor persisted.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn PersonStore>,
    cache: PersonCache,
    provider: Arc<dyn NationalityProvider>,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn PersonStore>,
        cache: PersonCache,
        provider: Arc<dyn NationalityProvider>,
    ) -> Self {
        Self {
            store,
            cache,
            provider,
        }
    }

    pub async fn resolve(&self, name: &str) -> NationalizeResult<Resolution> {
        if name.trim().is_empty() {
            return Err(ValidationError::missing("name").into());
        }

        let cached = self.cache.get(name).await;
        observe_cache_lookup(&cached);
        if let Some(record) = cached? {
            tracing::debug!(name, "Cache hit");
            return Ok(self.finish(Resolution::Cached(record)));
        }

        if let Some(record) = self.store.get(name).await? {
            tracing::debug!(name, "Store hit, populating cache");
            let put = self.cache.put(&record).await;
            observe_cache("set", &put);
            put?;
            return Ok(self.finish(Resolution::Stored(record)));
        }

        tracing::debug!(name, provider = self.provider.provider_id(), "Falling back to upstream");
        let record = self.provider.predict(name).await?;
        Ok(self.finish(Resolution::External(record)))
    }

    fn finish(&self, resolution: Resolution) -> Resolution {
        with_metrics(|m| m.record_resolution(resolution.source()));
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nationalize_core::NationalizeError;
    use nationalize_test_utils::{
        assertions, fixtures, CacheBackend, CallLog, CountingCache, CountingStore,
        InMemoryCacheBackend, InMemoryPersonStore, StubProvider,
    };
    use serde_json::json;

    struct Harness {
        log: CallLog,
        store: Arc<CountingStore>,
        cache: Arc<CountingCache>,
        provider: Arc<StubProvider>,
        resolver: Resolver,
    }

    fn harness(
        records: Vec<PersonRecord>,
        script: impl FnOnce(StubProvider) -> StubProvider,
    ) -> Harness {
        let log = CallLog::new();
        let store = fixtures::counting_store(records, &log);
        let cache = fixtures::counting_cache(&log);
        let provider = Arc::new(script(StubProvider::with_log(log.clone())));
        let resolver = Resolver::new(
            store.clone(),
            PersonCache::with_default_ttl(cache.clone()),
            provider.clone(),
        );
        Harness {
            log,
            store,
            cache,
            provider,
            resolver,
        }
    }

    #[tokio::test]
    async fn test_store_hit_skips_upstream_and_populates_cache() -> NationalizeResult<()> {
        let h = harness(vec![fixtures::vadim()], |p| p);

        let first = h.resolver.resolve("Vadim").await?;
        assert_eq!(first, Resolution::Stored(fixtures::vadim()));
        assert_eq!(h.provider.calls(), 0);
        assert_eq!(h.cache.set_calls(), 1);

        let second = h.resolver.resolve("Vadim").await?;
        assert_eq!(second, Resolution::Cached(fixtures::vadim()));
        assert_eq!(h.store.get_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_hit_never_touches_store() -> NationalizeResult<()> {
        let h = harness(vec![], |p| p);
        PersonCache::with_default_ttl(h.cache.clone())
            .put(&fixtures::olga())
            .await?;
        h.log.clear();

        let resolution = h.resolver.resolve("Olga").await?;
        assert_eq!(resolution.source(), "cache");
        assert_eq!(h.store.total_calls(), 0);
        assert_eq!(h.provider.calls(), 0);
        assert_eq!(h.log.calls(), vec!["cache.get"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_order_is_cache_store_upstream() -> NationalizeResult<()> {
        let h = harness(vec![], |p| p);

        let resolution = h.resolver.resolve("Nobody").await?;
        assert_eq!(resolution.source(), "external");
        assert_eq!(resolution.record().count, 0);
        assert_eq!(
            h.log.calls(),
            vec!["cache.get", "store.get", "provider.predict"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_upstream_result_is_not_cached_or_persisted() -> NationalizeResult<()> {
        let h = harness(vec![], |p| p.with_record(fixtures::olga()));

        let resolution = h.resolver.resolve("Olga").await?;
        assert_eq!(resolution.into_record(), fixtures::olga());
        assert_eq!(h.cache.set_calls(), 0);
        assert_eq!(h.store.write_calls(), 0);

        h.resolver.resolve("Olga").await?;
        assert_eq!(h.provider.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_upstream_status_is_surfaced() {
        let h = harness(vec![], |p| p.with_status("Limited", 429));
        let result = h.resolver.resolve("Limited").await;
        assertions::assert_upstream_status(&result, 429);
        assert_eq!(h.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_touches_nothing() {
        let h = harness(vec![], |p| p);
        for name in ["", "   "] {
            let result = h.resolver.resolve(name).await;
            assertions::assert_validation_error(&result);
        }
        assert_eq!(h.cache.total_calls(), 0);
        assert_eq!(h.store.total_calls(), 0);
        assert_eq!(h.provider.calls(), 0);
        assert!(h.log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_names_are_case_sensitive() -> NationalizeResult<()> {
        let h = harness(vec![fixtures::vadim()], |p| p);
        let resolution = h.resolver.resolve("vadim").await?;
        assert_eq!(resolution.source(), "external");
        Ok(())
    }

    #[tokio::test]
    async fn test_undecodable_cache_entry_falls_through_to_store() -> NationalizeResult<()> {
        let h = harness(vec![fixtures::vadim()], |p| p);
        h.cache
            .set("Vadim", json!({"unexpected": true}), nationalize_core::CACHE_TTL)
            .await?;

        let resolution = h.resolver.resolve("Vadim").await?;
        assert_eq!(resolution, Resolution::Stored(fixtures::vadim()));
        assert_eq!(h.provider.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_failure_fails_fast() {
        let store = Arc::new(CountingStore::new(Arc::new(InMemoryPersonStore::new())));
        let cache = Arc::new(CountingCache::new(Arc::new(InMemoryCacheBackend::new())).failing());
        let provider = Arc::new(StubProvider::new());
        let resolver = Resolver::new(
            store.clone(),
            PersonCache::with_default_ttl(cache),
            provider.clone(),
        );

        let result = resolver.resolve("Vadim").await;
        assert!(matches!(result, Err(NationalizeError::Cache(_))));
        assert_eq!(store.total_calls(), 0);
        assert_eq!(provider.calls(), 0);
    }
}
