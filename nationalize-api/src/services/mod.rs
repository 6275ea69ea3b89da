//! Service Layer
//!
//! Business logic between the HTTP handlers and the store, cache and
//! upstream provider. Services speak `NationalizeResult`; handlers translate
//! to `ApiError`.

mod record_service;
mod resolver;

pub use record_service::*;
pub use resolver::*;

use nationalize_storage::CacheResult;

use crate::telemetry::metrics::with_metrics;

/// Count a cache write by outcome: `ok` or `error`.
fn observe_cache<T>(operation: &str, result: &CacheResult<T>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    with_metrics(|m| m.record_cache_operation(operation, outcome));
}

/// Count a cache lookup as `hit`, `miss` or `error` under operation `get`.
fn observe_cache_lookup<T>(result: &CacheResult<Option<T>>) {
    let outcome = match result {
        Ok(Some(_)) => "hit",
        Ok(None) => "miss",
        Err(_) => "error",
    };
    with_metrics(|m| m.record_cache_operation("get", outcome));
}
