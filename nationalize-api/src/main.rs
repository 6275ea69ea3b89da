//! Nationalize API Server Entry Point
//!
//! Bootstraps telemetry and configuration, opens the configured store and
//! cache, and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use nationalize_api::{
    create_api_router, ApiError, ApiResult, AppState, CacheConfig, CacheKind, DbConfig,
    NationalizeIoProvider, PgPersonStore, ServiceConfig, StoreKind,
};
use nationalize_storage::{
    CacheBackend, InMemoryCacheBackend, InMemoryPersonStore, LmdbCacheBackend, PersonCache,
    PersonStore,
};

use nationalize_api::telemetry::{init_tracing, shutdown_tracing, TelemetryConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let config = ServiceConfig::from_env()?;

    let store = open_store(config.store).await?;
    let cache = PersonCache::new(open_cache(&config.cache)?, config.cache.ttl);
    let provider = Arc::new(NationalizeIoProvider::new(&config.upstream)?);
    tracing::info!(
        store = ?config.store,
        cache = cache.backend().backend_name(),
        upstream = provider.base_url(),
        "Backends ready"
    );

    let state = AppState::new(store, cache, provider);
    let app: Router = create_api_router(state, &config.api);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Nationalize API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    shutdown_tracing();
    Ok(())
}

async fn open_store(kind: StoreKind) -> ApiResult<Arc<dyn PersonStore>> {
    match kind {
        StoreKind::Memory => Ok(Arc::new(InMemoryPersonStore::new())),
        StoreKind::Postgres => {
            let store = PgPersonStore::from_config(&DbConfig::from_env())?;
            store
                .ensure_schema()
                .await
                .map_err(|e| ApiError::database_error(e.to_string()))?;
            Ok(Arc::new(store))
        }
    }
}

fn open_cache(config: &CacheConfig) -> ApiResult<Arc<dyn CacheBackend>> {
    match config.kind {
        CacheKind::Memory => Ok(Arc::new(InMemoryCacheBackend::new())),
        CacheKind::Lmdb => {
            let backend = LmdbCacheBackend::new(&config.path, config.max_size_mb)
                .map_err(|e| ApiError::cache_error(format!("Failed to open LMDB cache: {}", e)))?;
            Ok(Arc::new(backend))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("NATIONALIZE_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("NATIONALIZE_API_PORT").ok())
        .unwrap_or_else(|| "8000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
