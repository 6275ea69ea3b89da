//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use nationalize_core::NationalityProvider;
use nationalize_storage::{PersonCache, PersonStore};

use crate::services::{RecordService, Resolver};

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Read path: cache, store, upstream.
    pub resolver: Resolver,
    /// Write path with cache maintenance.
    pub records: RecordService,
    /// Raw store handle, for readiness probes.
    pub store: Arc<dyn PersonStore>,
    /// Raw cache handle, for readiness probes.
    pub cache: PersonCache,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the services over the given collaborators.
    pub fn new(
        store: Arc<dyn PersonStore>,
        cache: PersonCache,
        provider: Arc<dyn NationalityProvider>,
    ) -> Self {
        Self {
            resolver: Resolver::new(store.clone(), cache.clone(), provider),
            records: RecordService::new(store.clone(), cache.clone()),
            store,
            cache,
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(Resolver, resolver);
crate::impl_from_ref!(RecordService, records);
