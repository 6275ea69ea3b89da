//! HTTP-level tests for the names resource.
//!
//! The full router runs over the in-memory store and cache wrapped in
//! counting fakes, with a scripted upstream provider.

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use nationalize_api::SOURCE_HEADER;
use nationalize_test_utils::{fixtures, PersonStore};
use serde_json::json;

#[path = "support/app.rs"]
mod test_app_support;
use test_app_support::test_app;

// ============================================================================
// READS
// ============================================================================

#[tokio::test]
async fn get_without_name_is_400_and_touches_nothing() {
    let app = test_app(vec![fixtures::vadim()], |p| p);

    for uri in ["/api/v1/names/", "/api/v1/names/?name=", "/api/v1/names?name=%20"] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(response.body["code"], "MISSING_FIELD");
        assert_eq!(response.body["details"]["field"], "name");
    }

    assert!(app.log.calls().is_empty());
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn get_reports_the_serving_tier() {
    let app = test_app(vec![fixtures::vadim()], |p| p.with_record(fixtures::olga()));

    let first = app.get("/api/v1/names/?name=Vadim").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.headers[SOURCE_HEADER], "store");
    assert_eq!(first.body["count"], 1);

    let second = app.get("/api/v1/names?name=Vadim").await;
    assert_eq!(second.headers[SOURCE_HEADER], "cache");
    assert_eq!(second.body, first.body);

    let external = app.get("/api/v1/names/?name=Olga").await;
    assert_eq!(external.status, StatusCode::OK);
    assert_eq!(external.headers[SOURCE_HEADER], "external");
    assert_eq!(external.body["country"][0]["country_id"], "UA");
    assert_eq!(app.provider.calls(), 1);
}

#[tokio::test]
async fn upstream_status_is_passed_through() {
    let app = test_app(vec![], |p| p.with_status("Limited", 429));

    let response = app.get("/api/v1/names/?name=Limited").await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.body["code"], "UPSTREAM_ERROR");
    assert_eq!(response.body["details"]["upstream_status"], 429);
}

// ============================================================================
// WRITES
// ============================================================================

#[tokio::test]
async fn create_then_get_round_trips() {
    let app = test_app(vec![], |p| p);
    let body = json!({
        "name": "Vadim",
        "count": 1,
        "country": [
            {"country_id": "RU", "probability": 0.8},
            {"country_id": "US", "probability": 0.1}
        ]
    });

    let created = app.send(Method::POST, "/api/v1/names/", Some(body.clone())).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body, body);
    assert_eq!(app.cache.set_calls(), 0);

    let fetched = app.get("/api/v1/names/?name=Vadim").await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.headers[SOURCE_HEADER], "store");
    assert_eq!(fetched.body, body);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn duplicate_create_is_409() {
    let app = test_app(vec![fixtures::vadim()], |p| p);
    let response = app
        .send(
            Method::POST,
            "/api/v1/names/",
            Some(json!({"name": "Vadim", "count": 2, "country": []})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["code"], "PERSON_ALREADY_EXISTS");
}

#[tokio::test]
async fn create_validation_errors_are_400() {
    let app = test_app(vec![], |p| p);

    let missing = app
        .send(Method::POST, "/api/v1/names/", Some(json!({"name": "Vadim", "count": 1})))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["code"], "MISSING_FIELD");
    assert_eq!(missing.body["details"]["field"], "country");

    let duplicate_ids = app
        .send(
            Method::POST,
            "/api/v1/names/",
            Some(json!({
                "name": "Vadim",
                "count": 1,
                "country": [
                    {"country_id": "RU", "probability": 0.5},
                    {"country_id": "RU", "probability": 0.4}
                ]
            })),
        )
        .await;
    assert_eq!(duplicate_ids.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate_ids.body["code"], "INVALID_INPUT");

    let out_of_range = app
        .send(
            Method::POST,
            "/api/v1/names/",
            Some(json!({
                "name": "Vadim",
                "count": 1,
                "country": [{"country_id": "RU", "probability": 1.5}]
            })),
        )
        .await;
    assert_eq!(out_of_range.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.write_calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_structured_400() {
    let app = test_app(vec![], |p| p);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/names/")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": \"Vadim\","))
        .expect("request builds");

    let response = app.send_raw(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_INPUT");
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn patch_merges_countries_and_refreshes_cache() {
    let app = test_app(vec![fixtures::vadim()], |p| p);
    // Warm the cache with the pre-patch record.
    app.get("/api/v1/names/?name=Vadim").await;

    let response = app
        .send(
            Method::PATCH,
            "/api/v1/names/",
            Some(json!({
                "name": "Vadim",
                "country": [
                    {"country_id": "RU", "probability": 0.95},
                    {"country_id": "FR", "probability": 0.05}
                ]
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let expected = json!([
        {"country_id": "RU", "probability": 0.95},
        {"country_id": "US", "probability": 0.1},
        {"country_id": "FR", "probability": 0.05}
    ]);
    assert_eq!(response.body["country"], expected);
    assert_eq!(response.body["count"], 1);

    let fetched = app.get("/api/v1/names/?name=Vadim").await;
    assert_eq!(fetched.headers[SOURCE_HEADER], "cache");
    assert_eq!(fetched.body["country"], expected);
}

#[tokio::test]
async fn patch_requires_name_and_existing_record() {
    let app = test_app(vec![], |p| p);

    let no_name = app
        .send(Method::PATCH, "/api/v1/names/", Some(json!({"count": 3})))
        .await;
    assert_eq!(no_name.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_name.body["code"], "MISSING_FIELD");

    let missing = app
        .send(Method::PATCH, "/api/v1/names/", Some(json!({"name": "Ghost", "count": 3})))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["code"], "PERSON_NOT_FOUND");
}

#[tokio::test]
async fn put_replaces_countries_verbatim() {
    let app = test_app(vec![fixtures::vadim()], |p| p);
    app.get("/api/v1/names/?name=Vadim").await;

    let response = app
        .send(
            Method::PUT,
            "/api/v1/names",
            Some(json!({
                "name": "Vadim",
                "count": 7,
                "country": [{"country_id": "DE", "probability": 1.0}]
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["country"],
        json!([{"country_id": "DE", "probability": 1.0}])
    );

    let fetched = app.get("/api/v1/names/?name=Vadim").await;
    assert_eq!(fetched.headers[SOURCE_HEADER], "cache");
    assert_eq!(fetched.body["count"], 7);
}

#[tokio::test]
async fn put_on_unknown_name_is_404_even_with_incomplete_body() {
    let app = test_app(vec![], |p| p);
    let response = app
        .send(Method::PUT, "/api/v1/names/", Some(json!({"name": "Ghost"})))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let app = test_app(vec![fixtures::vadim()], |p| p);
    let response = app
        .send(Method::PUT, "/api/v1/names/", Some(json!({"name": "Vadim"})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn delete_twice_is_204_then_404() {
    let app = test_app(vec![fixtures::vadim()], |p| p);
    app.get("/api/v1/names/?name=Vadim").await;

    let first = app.send(Method::DELETE, "/api/v1/names/?name=Vadim", None).await;
    assert_eq!(first.status, StatusCode::NO_CONTENT);
    assert!(first.body.is_null());

    let second = app.send(Method::DELETE, "/api/v1/names/?name=Vadim", None).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    assert_eq!(second.body["code"], "PERSON_NOT_FOUND");

    // The evicted entry is gone, so the read falls through to upstream.
    let fetched = app.get("/api/v1/names/?name=Vadim").await;
    assert_eq!(fetched.headers[SOURCE_HEADER], "external");
}

#[tokio::test]
async fn delete_without_name_is_400() {
    let app = test_app(vec![], |p| p);
    let response = app.send(Method::DELETE, "/api/v1/names/", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.log.calls().is_empty());
}

// ============================================================================
// LISTING AND AUXILIARY ENDPOINTS
// ============================================================================

#[tokio::test]
async fn list_filters_and_paginates() {
    let app = test_app(vec![fixtures::vadim(), fixtures::olga()], |p| p);

    let all = app.get("/api/v1/names/list").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["total"], 2);
    assert_eq!(all.body["items"][0]["name"], "Vadim");
    assert_eq!(all.body["limit"], 100);

    let searched = app.get("/api/v1/names/list?search=OLG").await;
    assert_eq!(searched.body["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(searched.body["items"][0]["name"], "Olga");

    let paged = app.get("/api/v1/names/list?limit=1&offset=1").await;
    assert_eq!(paged.body["items"][0]["name"], "Olga");
    assert_eq!(paged.body["offset"], 1);

    let bad = app.get("/api/v1/names/list?limit=lots").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["code"], "INVALID_INPUT");

    assert_eq!(app.cache.total_calls(), 0);
}

#[tokio::test]
async fn list_total_counts_only_filtered_records() {
    let app = test_app(vec![fixtures::vadim(), fixtures::olga()], |p| p);

    let searched = app.get("/api/v1/names/list?search=vad&limit=1").await;
    assert_eq!(searched.status, StatusCode::OK);
    assert_eq!(searched.body["total"], 1);
    assert_eq!(searched.body["items"][0]["name"], "Vadim");

    let past_end = app.get("/api/v1/names/list?search=vad&offset=1").await;
    assert_eq!(past_end.body["total"], 1);
    assert_eq!(past_end.body["items"].as_array().map(Vec::len), Some(0));

    let nothing = app.get("/api/v1/names/list?search=zzz").await;
    assert_eq!(nothing.body["total"], 0);
}

#[tokio::test]
async fn health_and_metrics_are_served() {
    let app = test_app(vec![], |p| p);

    let ready = app.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["status"], "healthy");

    app.get("/api/v1/names/?name=Vadim").await;
    let metrics = app.get("/metrics").await;
    assert_eq!(metrics.status, StatusCode::OK);
    let text = metrics.body.as_str().unwrap_or_default().to_string();
    assert!(text.contains("nationalize_resolutions_total"));
}

#[tokio::test]
async fn store_contents_match_http_view() {
    let app = test_app(vec![], |p| p);
    app.send(
        Method::POST,
        "/api/v1/names/",
        Some(json!({"name": "Olga", "count": 42, "country": []})),
    )
    .await;
    let stored = app.store.get("Olga").await.expect("store reads");
    assert_eq!(stored.map(|r| r.count), Some(42));
}
