//! API Configuration Module
//!
//! Configuration for CORS, backend selection, the cache and the upstream
//! nationality API. Everything is loaded from environment variables with
//! defaults suitable for local development. Unparseable numbers fall back to
//! their default; an unknown backend name is a startup error.

use std::path::PathBuf;
use std::time::Duration;

use nationalize_core::CACHE_TTL;

use crate::error::{ApiError, ApiResult};

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP-facing configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// - `NATIONALIZE_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `NATIONALIZE_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `NATIONALIZE_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("NATIONALIZE_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("NATIONALIZE_CORS_ALLOW_CREDENTIALS")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs: env_parse("NATIONALIZE_CORS_MAX_AGE_SECS", 86400),
        }
    }

    /// Strict CORS is on once any origin is configured.
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

// ============================================================================
// BACKEND SELECTION
// ============================================================================

/// Which persistent store to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Postgres,
}

impl std::str::FromStr for StoreKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(ApiError::invalid_input(format!(
                "Unknown NATIONALIZE_STORE '{}', expected memory or postgres",
                other
            ))),
        }
    }
}

/// Which cache backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Memory,
    Lmdb,
}

impl std::str::FromStr for CacheKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "lmdb" => Ok(Self::Lmdb),
            other => Err(ApiError::invalid_input(format!(
                "Unknown NATIONALIZE_CACHE '{}', expected memory or lmdb",
                other
            ))),
        }
    }
}

/// Cache backend settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub kind: CacheKind,
    /// Directory for the LMDB environment.
    pub path: PathBuf,
    pub max_size_mb: usize,
    /// Lifetime of every cache entry.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: CacheKind::Memory,
            path: PathBuf::from("./data/cache"),
            max_size_mb: 100,
            ttl: CACHE_TTL,
        }
    }
}

impl CacheConfig {
    /// - `NATIONALIZE_CACHE`: "memory" or "lmdb" (default: memory)
    /// - `NATIONALIZE_CACHE_PATH`: LMDB directory (default: ./data/cache)
    /// - `NATIONALIZE_CACHE_MAX_SIZE_MB`: LMDB map size (default: 100)
    /// - `NATIONALIZE_CACHE_TTL_SECS`: entry lifetime (default: 3600)
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();
        let kind = match std::env::var("NATIONALIZE_CACHE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.kind,
        };
        Ok(Self {
            kind,
            path: std::env::var("NATIONALIZE_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            max_size_mb: env_parse("NATIONALIZE_CACHE_MAX_SIZE_MB", defaults.max_size_mb),
            ttl: Duration::from_secs(env_parse(
                "NATIONALIZE_CACHE_TTL_SECS",
                defaults.ttl.as_secs(),
            )),
        })
    }
}

// ============================================================================
// UPSTREAM CONFIGURATION
// ============================================================================

/// Default base URL of the nationality API.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.nationalize.io";

/// Settings for the nationalize.io client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Optional key, sent as the `apikey` query parameter.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl UpstreamConfig {
    /// - `NATIONALIZE_UPSTREAM_URL` (default: https://api.nationalize.io)
    /// - `NATIONALIZE_UPSTREAM_API_KEY` (default: unset)
    /// - `NATIONALIZE_UPSTREAM_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("NATIONALIZE_UPSTREAM_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            api_key: std::env::var("NATIONALIZE_UPSTREAM_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            timeout: Duration::from_secs(env_parse("NATIONALIZE_UPSTREAM_TIMEOUT_SECS", 10)),
        }
    }
}

// ============================================================================
// SERVICE CONFIGURATION
// ============================================================================

/// Everything `main` needs to assemble the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api: ApiConfig,
    pub store: StoreKind,
    pub cache: CacheConfig,
    pub upstream: UpstreamConfig,
}

impl ServiceConfig {
    /// `NATIONALIZE_STORE`: "memory" or "postgres" (default: memory), plus
    /// the variables read by each section.
    pub fn from_env() -> ApiResult<Self> {
        let store = match std::env::var("NATIONALIZE_STORE") {
            Ok(value) => value.parse()?,
            Err(_) => StoreKind::Memory,
        };
        Ok(Self {
            api: ApiConfig::from_env(),
            store,
            cache: CacheConfig::from_env()?,
            upstream: UpstreamConfig::from_env(),
        })
    }
}
