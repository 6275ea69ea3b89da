//! Async person store trait.
//!
//! The persistent record store is addressed only by the unique `name`.
//! Implementations: [`crate::InMemoryPersonStore`] here and the Postgres
//! store in nationalize-api.

use ::async_trait::async_trait;
use nationalize_core::{PersonRecord, StorageError};

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Hard cap on page size for listings.
pub const MAX_LIST_LIMIT: usize = 1000;

/// Filters for listing stored records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive substring match on `name`.
    pub search: Option<String>,
    /// Exact match on `count`.
    pub count: Option<i64>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            count: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    /// Set the page size, clamped to `1..=MAX_LIST_LIMIT`.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_LIST_LIMIT);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Whether a record passes the `search` and `count` filters.
    pub fn matches(&self, record: &PersonRecord) -> bool {
        let name_ok = match &self.search {
            Some(needle) if !needle.is_empty() => record
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        };
        let count_ok = self.count.map_or(true, |c| record.count == c);
        name_ok && count_ok
    }
}

/// Persistent store for person records.
///
/// Writes are not transactionally coordinated with the cache; callers write
/// here first and touch the cache only after a successful write.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Get a record by name.
    async fn get(&self, name: &str) -> StorageResult<Option<PersonRecord>>;

    /// Insert a new record. Fails with `AlreadyExists` on a duplicate name.
    async fn insert(&self, record: &PersonRecord) -> StorageResult<()>;

    /// Overwrite an existing record. Fails with `NotFound` if absent.
    async fn update(&self, record: &PersonRecord) -> StorageResult<()>;

    /// Delete a record. Fails with `NotFound` if absent.
    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// List records in insertion order.
    async fn list(&self, query: &ListQuery) -> StorageResult<Vec<PersonRecord>>;

    /// Number of records passing the `search` and `count` filters of `query`.
    /// Paging fields are ignored.
    async fn count(&self, query: &ListQuery) -> StorageResult<u64>;
}
