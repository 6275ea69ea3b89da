//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling via deadpool-postgres and the
//! [`PgPersonStore`] implementation of [`PersonStore`].

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use nationalize_core::{CountryProbability, PersonRecord, StorageError};
use nationalize_storage::{ListQuery, PersonStore, StorageResult};
use std::time::Duration;
use tokio_postgres::types::Json;
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// How long to wait for a pooled connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "nationalize".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("NATIONALIZE_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("NATIONALIZE_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("NATIONALIZE_DB_NAME")
                .unwrap_or_else(|_| "nationalize".to_string()),
            user: std::env::var("NATIONALIZE_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("NATIONALIZE_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("NATIONALIZE_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("NATIONALIZE_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS persons (
    id      BIGSERIAL PRIMARY KEY,
    name    VARCHAR(255) NOT NULL UNIQUE,
    count   BIGINT NOT NULL,
    country JSONB NOT NULL
)";

// ============================================================================
// POSTGRES PERSON STORE
// ============================================================================

/// WHERE clause shared by `list` and `count`. `$1` is the search term,
/// `$2` the exact count.
const FILTER_SQL: &str = "WHERE ($1::text IS NULL OR strpos(lower(name), lower($1)) > 0) \
     AND ($2::bigint IS NULL OR count = $2)";

fn search_term(query: &ListQuery) -> Option<&str> {
    query.search.as_deref().filter(|s| !s.is_empty())
}

fn backend_err(context: &str, err: impl std::fmt::Display) -> StorageError {
    tracing::error!(error = %err, "{}", context);
    StorageError::Backend {
        reason: format!("{}: {}", context, err),
    }
}

/// [`PersonStore`] backed by the `persons` table.
#[derive(Clone)]
pub struct PgPersonStore {
    pool: Pool,
}

impl PgPersonStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    async fn get_conn(&self) -> StorageResult<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| backend_err("Failed to acquire database connection", e))
    }

    /// Create the `persons` table if it does not exist.
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA_SQL)
            .await
            .map_err(|e| backend_err("Failed to create schema", e))
    }

    fn row_to_record(row: &Row) -> StorageResult<PersonRecord> {
        let name: String = row
            .try_get("name")
            .map_err(|e| backend_err("Bad name column", e))?;
        let count: i64 = row
            .try_get("count")
            .map_err(|e| backend_err("Bad count column", e))?;
        let Json(country): Json<Vec<CountryProbability>> = row
            .try_get("country")
            .map_err(|e| backend_err("Bad country column", e))?;
        Ok(PersonRecord::new(name, count, country))
    }
}

#[async_trait]
impl PersonStore for PgPersonStore {
    async fn get(&self, name: &str) -> StorageResult<Option<PersonRecord>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT name, count, country FROM persons WHERE name = $1",
                &[&name],
            )
            .await
            .map_err(|e| backend_err("Failed to load person", e))?;
        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn insert(&self, record: &PersonRecord) -> StorageResult<()> {
        let conn = self.get_conn().await?;
        let inserted = conn
            .execute(
                "INSERT INTO persons (name, count, country) VALUES ($1, $2, $3) \
                 ON CONFLICT (name) DO NOTHING",
                &[&record.name, &record.count, &Json(&record.country)],
            )
            .await
            .map_err(|e| backend_err("Failed to insert person", e))?;
        if inserted == 0 {
            return Err(StorageError::AlreadyExists {
                name: record.name.clone(),
            });
        }
        Ok(())
    }

    async fn update(&self, record: &PersonRecord) -> StorageResult<()> {
        let conn = self.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE persons SET count = $2, country = $3 WHERE name = $1",
                &[&record.name, &record.count, &Json(&record.country)],
            )
            .await
            .map_err(|e| backend_err("Failed to update person", e))?;
        if updated == 0 {
            return Err(StorageError::NotFound {
                name: record.name.clone(),
            });
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM persons WHERE name = $1", &[&name])
            .await
            .map_err(|e| backend_err("Failed to delete person", e))?;
        if deleted == 0 {
            return Err(StorageError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> StorageResult<Vec<PersonRecord>> {
        let conn = self.get_conn().await?;
        let limit = query.limit as i64;
        let offset = query.offset as i64;
        let sql = format!(
            "SELECT name, count, country FROM persons {} ORDER BY id LIMIT $3 OFFSET $4",
            FILTER_SQL
        );
        let rows = conn
            .query(&sql, &[&search_term(query), &query.count, &limit, &offset])
            .await
            .map_err(|e| backend_err("Failed to list persons", e))?;
        rows.iter().map(Self::row_to_record).collect()
    }

    async fn count(&self, query: &ListQuery) -> StorageResult<u64> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT COUNT(*) FROM persons {}", FILTER_SQL);
        let row = conn
            .query_one(&sql, &[&search_term(query), &query.count])
            .await
            .map_err(|e| backend_err("Failed to count persons", e))?;
        let count: i64 = row
            .try_get(0)
            .map_err(|e| backend_err("Bad count result", e))?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "nationalize");
        assert_eq!(config.max_size, 16);
    }

    #[test]
    fn test_schema_declares_unique_name() {
        assert!(SCHEMA_SQL.contains("name    VARCHAR(255) NOT NULL UNIQUE"));
        assert!(SCHEMA_SQL.contains("country JSONB"));
    }

    #[test]
    fn test_empty_search_is_no_filter() {
        assert_eq!(search_term(&ListQuery::new().with_search("")), None);
        assert_eq!(search_term(&ListQuery::new().with_search("vad")), Some("vad"));
    }
}
