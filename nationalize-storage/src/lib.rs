//! Nationalize Storage - Store Trait, Cache Backends and In-Memory Store
//!
//! Defines the persistence and caching seams for person records.
//! The Postgres store lives in nationalize-api.

pub mod cache;
pub mod store;

pub use cache::{
    CacheBackend, CacheEntry, CacheResult, CacheStats, InMemoryCacheBackend, LmdbCacheBackend,
    LmdbCacheError, PersonCache,
};
pub use store::{ListQuery, PersonStore, StorageResult, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

use async_trait::async_trait;
use nationalize_core::{PersonRecord, StorageError};
use std::collections::HashMap;
use std::sync::RwLock;

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Clone)]
struct StoredPerson {
    /// Insertion sequence, used for listing order.
    id: u64,
    record: PersonRecord,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    persons: HashMap<String, StoredPerson>,
}

/// In-memory person store.
///
/// Used as the default store for local development and by tests. Enforces
/// the same uniqueness and not-found rules as the Postgres store.
#[derive(Debug, Default)]
pub struct InMemoryPersonStore {
    inner: RwLock<Inner>,
}

impl InMemoryPersonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `records`. Later duplicates are ignored.
    pub fn with_records(records: impl IntoIterator<Item = PersonRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.write() {
            for record in records {
                Self::insert_locked(&mut inner, record);
            }
        }
        store
    }

    /// Clear all records.
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.persons.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.persons.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_locked(inner: &mut Inner, record: PersonRecord) -> bool {
        if inner.persons.contains_key(&record.name) {
            return false;
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .persons
            .insert(record.name.clone(), StoredPerson { id, record });
        true
    }
}

#[async_trait]
impl PersonStore for InMemoryPersonStore {
    async fn get(&self, name: &str) -> StorageResult<Option<PersonRecord>> {
        let inner = self.inner.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(inner.persons.get(name).map(|p| p.record.clone()))
    }

    async fn insert(&self, record: &PersonRecord) -> StorageResult<()> {
        let mut inner = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        if !Self::insert_locked(&mut inner, record.clone()) {
            return Err(StorageError::AlreadyExists {
                name: record.name.clone(),
            });
        }
        Ok(())
    }

    async fn update(&self, record: &PersonRecord) -> StorageResult<()> {
        let mut inner = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        match inner.persons.get_mut(&record.name) {
            Some(stored) => {
                stored.record = record.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound {
                name: record.name.clone(),
            }),
        }
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let mut inner = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        inner
            .persons
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                name: name.to_string(),
            })
    }

    async fn list(&self, query: &ListQuery) -> StorageResult<Vec<PersonRecord>> {
        let inner = self.inner.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut matching: Vec<&StoredPerson> = inner
            .persons
            .values()
            .filter(|p| query.matches(&p.record))
            .collect();
        matching.sort_by_key(|p| p.id);
        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|p| p.record.clone())
            .collect())
    }

    async fn count(&self, query: &ListQuery) -> StorageResult<u64> {
        let inner = self.inner.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(inner
            .persons
            .values()
            .filter(|p| query.matches(&p.record))
            .count() as u64)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use nationalize_core::CountryProbability;

    fn make_person(name: &str, count: i64) -> PersonRecord {
        PersonRecord::new(name, count, vec![CountryProbability::new("RU", 0.8)])
    }

    #[tokio::test]
    async fn test_insert_get() -> StorageResult<()> {
        let store = InMemoryPersonStore::new();
        let person = make_person("Vadim", 1);
        store.insert(&person).await?;

        assert_eq!(store.get("Vadim").await?, Some(person));
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_is_case_sensitive() -> StorageResult<()> {
        let store = InMemoryPersonStore::with_records([make_person("Vadim", 1)]);
        assert!(store.get("vadim").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_duplicate() -> StorageResult<()> {
        let store = InMemoryPersonStore::new();
        store.insert(&make_person("Vadim", 1)).await?;

        let result = store.insert(&make_person("Vadim", 2)).await;
        assert!(matches!(result, Err(StorageError::AlreadyExists { .. })));
        assert_eq!(store.get("Vadim").await?.map(|p| p.count), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_existing_and_missing() -> StorageResult<()> {
        let store = InMemoryPersonStore::with_records([make_person("Vadim", 1)]);
        store.update(&make_person("Vadim", 5)).await?;
        assert_eq!(store.get("Vadim").await?.map(|p| p.count), Some(5));

        let result = store.update(&make_person("Olga", 1)).await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
        assert!(store.get("Olga").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_twice() -> StorageResult<()> {
        let store = InMemoryPersonStore::with_records([make_person("Vadim", 1)]);
        store.delete("Vadim").await?;
        assert!(store.is_empty());

        let result = store.delete("Vadim").await;
        assert_eq!(
            result,
            Err(StorageError::NotFound {
                name: "Vadim".to_string()
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order_and_paginates() -> StorageResult<()> {
        let store = InMemoryPersonStore::with_records([
            make_person("Vadim", 1),
            make_person("Olga", 2),
            make_person("Vadimir", 2),
            make_person("Ivan", 3),
        ]);

        let all = store.list(&ListQuery::new()).await?;
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Vadim", "Olga", "Vadimir", "Ivan"]);

        let page = store.list(&ListQuery::new().with_offset(1).with_limit(2)).await?;
        let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Olga", "Vadimir"]);

        let searched = store.list(&ListQuery::new().with_search("vad")).await?;
        assert_eq!(searched.len(), 2);

        let by_count = store.list(&ListQuery::new().with_count(2)).await?;
        assert_eq!(by_count.len(), 2);

        assert_eq!(store.count(&ListQuery::new()).await?, 4);
        assert_eq!(store.count(&ListQuery::new().with_search("vad")).await?, 2);
        assert_eq!(
            store
                .count(&ListQuery::new().with_search("vad").with_count(2).with_limit(1))
                .await?,
            1
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_clear() -> StorageResult<()> {
        let store = InMemoryPersonStore::with_records([make_person("Vadim", 1)]);
        store.clear();
        assert_eq!(store.count(&ListQuery::new()).await?, 0);
        Ok(())
    }

    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Insert followed by get returns the identical record.
        #[test]
        fn prop_insert_get_roundtrip(name in "[A-Za-z]{1,20}", count in 0i64..1_000_000) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let store = InMemoryPersonStore::new();
            let person = make_person(&name, count);
            let fetched = rt
                .block_on(async {
                    store.insert(&person).await?;
                    store.get(&name).await
                })
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(fetched, Some(person));
        }

        /// Operations on unknown names report NotFound.
        #[test]
        fn prop_missing_name_not_found(name in "[A-Za-z]{1,20}") {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let store = InMemoryPersonStore::new();
            let deleted = rt.block_on(store.delete(&name));
            let is_not_found = matches!(deleted, Err(StorageError::NotFound { .. }));
            prop_assert!(is_not_found);
        }
    }
}
