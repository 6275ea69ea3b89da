//! Record Service
//!
//! Write path for person records. Every mutation goes to the store first;
//! the cache entry for the name is then evicted or refreshed before the
//! call returns, so a read that follows never sees the old value.

use std::sync::Arc;

use nationalize_core::{
    validate_name, NationalizeError, NationalizeResult, PersonPatch, PersonRecord,
    ValidationError,
};
use nationalize_storage::{ListQuery, PersonCache, PersonStore};

use super::observe_cache;

/// A page of records plus the number of records matching the filters.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage {
    pub items: Vec<PersonRecord>,
    pub total: u64,
}

/// CRUD operations over the store with cache maintenance.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn PersonStore>,
    cache: PersonCache,
}

impl RecordService {
    pub fn new(store: Arc<dyn PersonStore>, cache: PersonCache) -> Self {
        Self { store, cache }
    }

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// `ValidationError` for a bad record, `StorageError::AlreadyExists` if
    /// the name is taken.
    pub async fn create(&self, record: PersonRecord) -> NationalizeResult<PersonRecord> {
        record.validate()?;
        self.store.insert(&record).await?;
        tracing::info!(name = %record.name, "Created person record");
        Ok(record)
    }

    /// Overwrite `count` and `country` of an existing record.
    ///
    /// The body's name must equal `name`; renames are not supported.
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` if no record exists, which takes precedence
    /// over body validation.
    pub async fn replace(
        &self,
        name: &str,
        record: PersonRecord,
    ) -> NationalizeResult<PersonRecord> {
        validate_name(name)?;
        self.require(name).await?;
        if record.name != name {
            return Err(ValidationError::invalid(
                "name",
                format!("body name '{}' does not match '{}'", record.name, name),
            )
            .into());
        }
        record.validate()?;

        self.store.update(&record).await?;
        self.refresh(&record).await?;
        tracing::info!(name, "Replaced person record");
        Ok(record)
    }

    /// Apply a partial update, merging countries by id.
    ///
    /// Read-modify-write without a lock: two concurrent patches on the same
    /// name can lose one of the updates.
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` if no record exists.
    pub async fn patch(&self, name: &str, patch: PersonPatch) -> NationalizeResult<PersonRecord> {
        validate_name(name)?;
        let current = self.require(name).await?;
        patch.validate()?;

        let merged = current.merged_with(patch);
        self.store.update(&merged).await?;
        self.refresh(&merged).await?;
        tracing::info!(name, countries = merged.country.len(), "Patched person record");
        Ok(merged)
    }

    /// Remove a record.
    ///
    /// The cache entry is evicted before the store delete, so a missing
    /// record still clears any stale cache entry.
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` if no record exists.
    pub async fn delete(&self, name: &str) -> NationalizeResult<()> {
        validate_name(name)?;
        let evicted = self.cache.evict(name).await;
        observe_cache("delete", &evicted);
        evicted?;

        self.store.delete(name).await?;
        tracing::info!(name, "Deleted person record");
        Ok(())
    }

    /// Filtered page of records in insertion order.
    pub async fn list(&self, query: &ListQuery) -> NationalizeResult<RecordPage> {
        let items = self.store.list(query).await?;
        let total = self.store.count(query).await?;
        Ok(RecordPage { items, total })
    }

    /// Fetch a stored record, bypassing the cache.
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` if no record exists.
    pub async fn require(&self, name: &str) -> NationalizeResult<PersonRecord> {
        self.store
            .get(name)
            .await?
            .ok_or_else(|| NationalizeError::not_found(name))
    }

    async fn refresh(&self, record: &PersonRecord) -> NationalizeResult<()> {
        let refreshed = self.cache.refresh(record).await;
        observe_cache("refresh", &refreshed);
        Ok(refreshed?)
    }
}
