//! Router fixture over counting fakes.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use nationalize_api::{create_api_router, ApiConfig, AppState};
use nationalize_test_utils::{
    fixtures, CallLog, CountingCache, CountingStore, PersonCache, PersonRecord, StubProvider,
};
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub log: CallLog,
    pub store: Arc<CountingStore>,
    pub cache: Arc<CountingCache>,
    pub provider: Arc<StubProvider>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn test_app(
    records: Vec<PersonRecord>,
    script: impl FnOnce(StubProvider) -> StubProvider,
) -> TestApp {
    let log = CallLog::new();
    let store = fixtures::counting_store(records, &log);
    let cache = fixtures::counting_cache(&log);
    let provider = Arc::new(script(StubProvider::with_log(log.clone())));
    let state = AppState::new(
        store.clone(),
        PersonCache::with_default_ttl(cache.clone()),
        provider.clone(),
    );
    TestApp {
        router: create_api_router(state, &ApiConfig::default()),
        log,
        store,
        cache,
        provider,
    }
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");
        self.send_raw(request).await
    }

    pub async fn send_raw(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }
}
