//! LMDB-backed cache implementation.
//!
//! Uses the heed crate (Rust bindings for LMDB) to keep cached person
//! records in a memory-mapped file that survives restarts.
//!
//! # Layout
//!
//! Keys are the raw UTF-8 bytes of the cache key. A key longer than the
//! environment's maximum key size is stored as `sha256:<hex digest>` instead.
//! Values are `[cached_at ms: 8][expires_at ms: 8][json value]`, timestamps
//! little-endian. Expired entries are deleted the first time they are read.

use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use nationalize_core::CacheError;
use sha2::{Digest, Sha256};

use super::entry::CacheEntry;
use super::traits::{CacheBackend, CacheResult, CacheStats};

const HEADER_LEN: usize = 16;
const DIGEST_KEY_PREFIX: &str = "sha256:";

/// Error type for LMDB cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    #[error("Failed to open database: {0}")]
    DbOpen(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbCacheError> for CacheError {
    fn from(e: LmdbCacheError) -> Self {
        CacheError::Backend {
            reason: e.to_string(),
        }
    }
}

fn txn_err(e: heed::Error) -> LmdbCacheError {
    LmdbCacheError::Transaction(e.to_string())
}

/// LMDB-backed cache.
///
/// # Example
///
/// ```ignore
/// use nationalize_storage::cache::{CacheBackend, LmdbCacheBackend};
///
/// let backend = LmdbCacheBackend::new("/var/lib/nationalize/cache", 100)?;
/// backend.set("Vadim", serde_json::json!({"count": 1}), ttl).await?;
/// let cached = backend.get("Vadim").await?;
/// ```
pub struct LmdbCacheBackend {
    env: Env,
    db: Database<Bytes, Bytes>,
    max_key_size: usize,
    stats: Arc<RwLock<CacheStats>>,
}

impl LmdbCacheBackend {
    /// Open (or create) an LMDB cache at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    /// - `max_size_mb` does not fit in a byte count
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        let map_size = max_size_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            LmdbCacheError::EnvOpen(format!("map size of {} MB overflows", max_size_mb))
        })?;
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per path by this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_err)?;

        let max_key_size = env.max_key_size();
        Ok(Self {
            env,
            db,
            max_key_size,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        })
    }

    fn record(&self, f: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.write() {
            f(&mut stats);
        }
    }

    /// LMDB key for a cache key. Oversized keys are replaced by their digest.
    fn storage_key(&self, key: &str) -> Vec<u8> {
        if key.len() <= self.max_key_size {
            return key.as_bytes().to_vec();
        }
        let digest = Sha256::digest(key.as_bytes());
        format!("{}{}", DIGEST_KEY_PREFIX, hex::encode(digest)).into_bytes()
    }

    fn encode(entry: &CacheEntry, key: &str) -> CacheResult<Vec<u8>> {
        let json = serde_json::to_vec(&entry.value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + json.len());
        bytes.extend_from_slice(&entry.cached_at.timestamp_millis().to_le_bytes());
        bytes.extend_from_slice(&entry.expires_at.timestamp_millis().to_le_bytes());
        bytes.extend_from_slice(&json);
        Ok(bytes)
    }

    fn decode(bytes: &[u8]) -> Option<CacheEntry> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let cached_ms = i64::from_le_bytes(bytes[0..8].try_into().ok()?);
        let expires_ms = i64::from_le_bytes(bytes[8..16].try_into().ok()?);
        let value = serde_json::from_slice(&bytes[HEADER_LEN..]).ok()?;
        Some(CacheEntry {
            value,
            cached_at: DateTime::from_timestamp_millis(cached_ms)?,
            expires_at: DateTime::from_timestamp_millis(expires_ms)?,
        })
    }

    fn remove(&self, key: &str) -> Result<bool, LmdbCacheError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let deleted = self
            .db
            .delete(&mut wtxn, &self.storage_key(key))
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(deleted)
    }
}

#[async_trait]
impl CacheBackend for LmdbCacheBackend {
    fn backend_name(&self) -> &'static str {
        "lmdb"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        let raw = {
            let rtxn = self.env.read_txn().map_err(txn_err)?;
            self.db
                .get(&rtxn, &self.storage_key(key))
                .map_err(txn_err)?
                .map(|bytes| bytes.to_vec())
        };

        let Some(raw) = raw else {
            self.record(|s| s.misses += 1);
            return Ok(None);
        };

        match Self::decode(&raw) {
            Some(entry) if !entry.is_expired_at(Utc::now()) => {
                self.record(|s| s.hits += 1);
                Ok(Some(entry))
            }
            Some(_) => {
                self.remove(key)?;
                self.record(|s| {
                    s.expirations += 1;
                    s.misses += 1;
                });
                Ok(None)
            }
            None => {
                tracing::warn!(key, "Dropping undecodable LMDB cache entry");
                self.remove(key)?;
                self.record(|s| s.misses += 1);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> CacheResult<()> {
        let entry = CacheEntry::new(value, Utc::now(), ttl);
        let bytes = Self::encode(&entry, key)?;

        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db
            .put(&mut wtxn, &self.storage_key(key), &bytes)
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.remove(key)?)
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let entry_count = {
            let rtxn = self.env.read_txn().map_err(txn_err)?;
            self.db.len(&rtxn).map_err(txn_err)?
        };
        let stats = self.stats.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(CacheStats {
            entry_count,
            ..stats.clone()
        })
    }
}
