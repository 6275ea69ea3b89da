//! Cache layer for person records.
//!
//! Backends store JSON values under string keys with a per-entry TTL and
//! know nothing about persons. [`PersonCache`] is the typed view the
//! services use: key = name, value = full record, TTL = one hour.
//!
//! # Example
//!
//! ```ignore
//! let cache = PersonCache::with_default_ttl(Arc::new(InMemoryCacheBackend::new()));
//! cache.put(&record).await?;
//! assert_eq!(cache.get("Vadim").await?, Some(record));
//! cache.evict("Vadim").await?;
//! ```

pub mod entry;
pub mod lmdb_backend;
pub mod memory;
pub mod person_cache;
pub mod traits;

pub use entry::CacheEntry;
pub use lmdb_backend::{LmdbCacheBackend, LmdbCacheError};
pub use memory::InMemoryCacheBackend;
pub use person_cache::PersonCache;
pub use traits::{CacheBackend, CacheResult, CacheStats};
