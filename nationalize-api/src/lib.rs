//! Nationalize API - REST Layer
//!
//! axum service resolving names to country probability distributions. Reads
//! go through the cache, then the record store, then nationalize.io. Writes
//! go to the store and keep the cache consistent.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod providers;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, CacheConfig, CacheKind, ServiceConfig, StoreKind, UpstreamConfig};
pub use db::{DbConfig, PgPersonStore};
pub use error::{ApiError, ApiResult, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use providers::NationalizeIoProvider;
pub use routes::{create_api_router, NAMES_PATH, SOURCE_HEADER};
pub use services::{RecordPage, RecordService, Resolution, Resolver};
pub use state::AppState;
pub use types::*;
