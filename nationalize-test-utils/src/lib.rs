//! Nationalize Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Call-counting wrappers around stores and cache backends
//! - A scripted nationality provider
//! - Proptest generators for person records
//! - Fixtures and assertions

pub use nationalize_core::{
    CacheError, CountryProbability, NationalityProvider, NationalizeError, NationalizeResult,
    PersonPatch, PersonRecord, StorageError, UpstreamError, ValidationError,
};
pub use nationalize_storage::{
    CacheBackend, CacheEntry, CacheResult, CacheStats, InMemoryCacheBackend,
    InMemoryPersonStore, ListQuery, PersonCache, PersonStore, StorageResult,
};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// CALL LOG
// ============================================================================

/// Ordered record of collaborator calls, shared between wrappers so tests
/// can assert on cross-collaborator ordering (e.g. store write before cache).
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: impl Into<String>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.into());
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Position of the first call equal to `call`.
    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

// ============================================================================
// COUNTING STORE
// ============================================================================

/// Store wrapper that counts calls per operation.
pub struct CountingStore {
    inner: Arc<dyn PersonStore>,
    log: CallLog,
    gets: AtomicUsize,
    writes: AtomicUsize,
    fail_writes: bool,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn PersonStore>) -> Self {
        Self::with_log(inner, CallLog::new())
    }

    pub fn with_log(inner: Arc<dyn PersonStore>, log: CallLog) -> Self {
        Self {
            inner,
            log,
            gets: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_writes: false,
        }
    }

    /// Make every insert/update/delete fail with a backend error.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.get_calls() + self.write_calls()
    }

    fn write(&self, op: &str) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("store.{}", op));
        if self.fail_writes {
            return Err(StorageError::Backend {
                reason: "injected write failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PersonStore for CountingStore {
    async fn get(&self, name: &str) -> StorageResult<Option<PersonRecord>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.log.push("store.get");
        self.inner.get(name).await
    }

    async fn insert(&self, record: &PersonRecord) -> StorageResult<()> {
        self.write("insert")?;
        self.inner.insert(record).await
    }

    async fn update(&self, record: &PersonRecord) -> StorageResult<()> {
        self.write("update")?;
        self.inner.update(record).await
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        self.write("delete")?;
        self.inner.delete(name).await
    }

    async fn list(&self, query: &ListQuery) -> StorageResult<Vec<PersonRecord>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.log.push("store.list");
        self.inner.list(query).await
    }

    async fn count(&self, query: &ListQuery) -> StorageResult<u64> {
        self.inner.count(query).await
    }
}

// ============================================================================
// COUNTING CACHE
// ============================================================================

/// Cache backend wrapper that counts calls per operation.
pub struct CountingCache {
    inner: Arc<dyn CacheBackend>,
    log: CallLog,
    gets: AtomicUsize,
    sets: AtomicUsize,
    deletes: AtomicUsize,
    fail_all: bool,
}

impl CountingCache {
    pub fn new(inner: Arc<dyn CacheBackend>) -> Self {
        Self::with_log(inner, CallLog::new())
    }

    pub fn with_log(inner: Arc<dyn CacheBackend>, log: CallLog) -> Self {
        Self {
            inner,
            log,
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            fail_all: false,
        }
    }

    /// Make every operation fail with a backend error.
    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.get_calls() + self.set_calls() + self.delete_calls()
    }

    fn check(&self) -> CacheResult<()> {
        if self.fail_all {
            return Err(CacheError::Backend {
                reason: "injected cache failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for CountingCache {
    fn backend_name(&self) -> &'static str {
        "counting"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.log.push("cache.get");
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.log.push("cache.set");
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.log.push("cache.delete");
        self.check()?;
        self.inner.delete(key).await
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        self.check()?;
        self.inner.stats().await
    }
}

// ============================================================================
// STUB PROVIDER
// ============================================================================

/// Scripted nationality provider.
///
/// Names with a scripted response get it; any other name yields a record
/// with zero count and no countries, the shape nationalize.io returns for
/// unknown names.
#[derive(Default)]
pub struct StubProvider {
    responses: Mutex<HashMap<String, NationalizeResult<PersonRecord>>>,
    calls: AtomicUsize,
    log: CallLog,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Script a successful prediction.
    pub fn with_record(self, record: PersonRecord) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(record.name.clone(), Ok(record));
        }
        self
    }

    /// Script an upstream status failure for `name`.
    pub fn with_status(self, name: &str, status: u16) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(
                name.to_string(),
                Err(UpstreamError::Status { status }.into()),
            );
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NationalityProvider for StubProvider {
    fn provider_id(&self) -> &str {
        "stub"
    }

    async fn predict(&self, name: &str) -> NationalizeResult<PersonRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.push("provider.predict");
        let scripted = self
            .responses
            .lock()
            .ok()
            .and_then(|responses| responses.get(name).cloned());
        scripted.unwrap_or_else(|| Ok(PersonRecord::new(name, 0, vec![])))
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for person records.

    use super::*;
    use proptest::prelude::*;

    /// A plausible person name.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{1,15}"
    }

    /// A two-letter upper-case country code.
    pub fn arb_country_id() -> impl Strategy<Value = String> {
        "[A-Z]{2}"
    }

    pub fn arb_country_probability() -> impl Strategy<Value = CountryProbability> {
        (arb_country_id(), 0.0f64..=1.0).prop_map(|(id, p)| CountryProbability::new(id, p))
    }

    /// A country list with unique ids, as a valid record requires.
    pub fn arb_country_list() -> impl Strategy<Value = Vec<CountryProbability>> {
        prop::collection::btree_map(arb_country_id(), 0.0f64..=1.0, 0..8).prop_map(|map| {
            map.into_iter()
                .map(|(id, p)| CountryProbability::new(id, p))
                .collect()
        })
    }

    pub fn arb_person_record() -> impl Strategy<Value = PersonRecord> {
        (arb_name(), 0i64..1_000_000, arb_country_list())
            .prop_map(|(name, count, country)| PersonRecord::new(name, count, country))
    }

    pub fn arb_person_patch() -> impl Strategy<Value = PersonPatch> {
        (
            prop::option::of(0i64..1_000_000),
            prop::option::of(arb_country_list()),
        )
            .prop_map(|(count, country)| PersonPatch { count, country })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Canonical records used across tests.

    use super::*;

    pub fn vadim() -> PersonRecord {
        PersonRecord::new(
            "Vadim",
            1,
            vec![
                CountryProbability::new("RU", 0.8),
                CountryProbability::new("US", 0.1),
            ],
        )
    }

    pub fn olga() -> PersonRecord {
        PersonRecord::new(
            "Olga",
            42,
            vec![
                CountryProbability::new("UA", 0.6),
                CountryProbability::new("RU", 0.3),
            ],
        )
    }

    /// Patch from the canonical merge example: RU updated, FR appended.
    pub fn ru_fr_patch() -> PersonPatch {
        PersonPatch {
            count: None,
            country: Some(vec![
                CountryProbability::new("RU", 0.95),
                CountryProbability::new("FR", 0.05),
            ]),
        }
    }

    /// In-memory store seeded with `records`, behind a counting wrapper.
    pub fn counting_store(records: Vec<PersonRecord>, log: &CallLog) -> Arc<CountingStore> {
        Arc::new(CountingStore::with_log(
            Arc::new(InMemoryPersonStore::with_records(records)),
            log.clone(),
        ))
    }

    /// Empty in-memory cache backend behind a counting wrapper.
    pub fn counting_cache(log: &CallLog) -> Arc<CountingCache> {
        Arc::new(CountingCache::with_log(
            Arc::new(InMemoryCacheBackend::new()),
            log.clone(),
        ))
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on nationalize results.

    use super::*;

    /// Assert that the result is a not-found storage error.
    pub fn assert_not_found<T: std::fmt::Debug>(result: &NationalizeResult<T>) {
        assert!(
            matches!(
                result,
                Err(NationalizeError::Storage(StorageError::NotFound { .. }))
            ),
            "Expected not-found error, got {:?}",
            result
        );
    }

    /// Assert that the result is a validation error.
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &NationalizeResult<T>) {
        assert!(
            matches!(result, Err(NationalizeError::Validation(_))),
            "Expected validation error, got {:?}",
            result
        );
    }

    /// Assert that the result is an upstream status error with `status`.
    pub fn assert_upstream_status<T: std::fmt::Debug>(result: &NationalizeResult<T>, status: u16) {
        assert!(
            matches!(
                result,
                Err(NationalizeError::Upstream(UpstreamError::Status { status: s })) if *s == status
            ),
            "Expected upstream status {}, got {:?}",
            status,
            result
        );
    }

    /// Assert that a country list has no duplicate ids.
    pub fn assert_unique_countries(record: &PersonRecord) {
        let mut seen = std::collections::HashSet::new();
        for entry in &record.country {
            assert!(
                seen.insert(entry.country_id.as_str()),
                "Duplicate country_id {} in {:?}",
                entry.country_id,
                record
            );
        }
    }
}
