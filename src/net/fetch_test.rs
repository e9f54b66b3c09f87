use super::*;
use crate::test_support::{api_client, dead_base_url, serve};
use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus};
use axum::routing::{get, post};
use serde_json::{Value, json};
use std::collections::HashMap;

fn header_str(headers: &AxumHeaders, name: &str) -> Value {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map_or(Value::Null, |v| Value::String(v.to_owned()))
}

async fn echo_headers(headers: AxumHeaders) -> Json<Value> {
    Json(json!({
        "authorization": header_str(&headers, "authorization"),
        "content_type": header_str(&headers, "content-type"),
        "x_request_source": header_str(&headers, "x-request-source"),
    }))
}

async fn echo_body(body: String) -> Json<Value> {
    Json(json!({ "body": body }))
}

async fn echo_query(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let page: u64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    Json(json!({
        "count": 42,
        "next": null,
        "previous": null,
        "results": [{ "page": page, "page_size": params.get("page_size") }],
    }))
}

fn router() -> Router {
    Router::new()
        .route("/api/headers/", get(echo_headers))
        .route("/api/echo/", post(echo_body))
        .route("/api/assets/", get(echo_query))
        .route("/api/empty/", axum::routing::delete(|| async { AxumStatus::NO_CONTENT }))
        .route(
            "/api/denied/",
            get(|| async { (AxumStatus::UNAUTHORIZED, Json(json!({ "detail": "Invalid username or password" }))) }),
        )
        .route(
            "/api/invalid/",
            get(|| async { (AxumStatus::BAD_REQUEST, Json(json!({ "message": "Serial number required" }))) }),
        )
        .route("/api/broken/", get(|| async { (AxumStatus::BAD_GATEWAY, "<html>proxy error</html>") }))
        .route("/api/garbled/", get(|| async { "not json at all" }))
}

// =============================================================
// merge_headers
// =============================================================

#[test]
fn merge_headers_sets_defaults() {
    let headers = merge_headers("abc", &RequestOptions::get()).unwrap();
    assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
}

#[test]
fn merge_headers_caller_wins_on_conflict() {
    let opts = RequestOptions::get().header("Content-Type", "text/csv");
    let headers = merge_headers("abc", &opts).unwrap();
    assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/csv");
    assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
}

#[test]
fn merge_headers_omit_drops_default() {
    let opts = RequestOptions::get().without_header("content-type");
    let headers = merge_headers("abc", &opts).unwrap();
    assert!(headers.get(CONTENT_TYPE).is_none());
    assert!(headers.get(AUTHORIZATION).is_some());
}

#[test]
fn merge_headers_rejects_invalid_name() {
    let opts = RequestOptions::get().header("bad header", "x");
    assert!(matches!(merge_headers("abc", &opts), Err(FetchError::InvalidHeader(_))));
}

// =============================================================
// fetch
// =============================================================

#[tokio::test]
async fn fetch_sends_bearer_and_json_content_type() {
    let client = api_client(&serve(router()).await);
    let body: Value = client
        .fetch("headers/", "tok1", RequestOptions::get().header("X-Request-Source", "desk"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(body["authorization"], "Bearer tok1");
    assert_eq!(body["content_type"], "application/json");
    assert_eq!(body["x_request_source"], "desk");
}

#[tokio::test]
async fn fetch_omitted_content_type_is_not_sent() {
    let client = api_client(&serve(router()).await);
    let body: Value = client
        .fetch("/headers/", "tok1", RequestOptions::get().without_header("Content-Type"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(body["content_type"], Value::Null);
}

#[tokio::test]
async fn fetch_posts_json_body() {
    let client = api_client(&serve(router()).await);
    let body: Value = client
        .fetch("echo/", "tok1", RequestOptions::post(json!({ "asset_tag": "IT-001" })))
        .await
        .unwrap()
        .unwrap();
    let sent: Value = serde_json::from_str(body["body"].as_str().unwrap()).unwrap();
    assert_eq!(sent, json!({ "asset_tag": "IT-001" }));
}

#[tokio::test]
async fn fetch_204_resolves_none() {
    let client = api_client(&serve(router()).await);
    let result: Option<Value> = client
        .fetch("empty/", "tok1", RequestOptions::delete())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn fetch_401_carries_detail_message() {
    let client = api_client(&serve(router()).await);
    let err = client
        .fetch::<Value>("denied/", "tok1", RequestOptions::get())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid username or password");
    assert_eq!(err.status(), Some(401));
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn fetch_400_carries_message_field() {
    let client = api_client(&serve(router()).await);
    let err = client
        .fetch::<Value>("invalid/", "tok1", RequestOptions::get())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Serial number required");
    assert!(!err.is_auth_failure());
}

#[tokio::test]
async fn fetch_non_json_error_uses_status_text() {
    let client = api_client(&serve(router()).await);
    let err = client
        .fetch::<Value>("broken/", "tok1", RequestOptions::get())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Bad Gateway");
    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn fetch_non_json_success_is_decode_error() {
    let client = api_client(&serve(router()).await);
    let err = client
        .fetch::<Value>("garbled/", "tok1", RequestOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn fetch_blank_token_fails_without_request() {
    let client = api_client(&dead_base_url().await);
    let err = client
        .fetch::<Value>("headers/", "  ", RequestOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::MissingToken));
}

#[tokio::test]
async fn fetch_connection_refused_is_network_error() {
    let client = api_client(&dead_base_url().await);
    let err = client
        .fetch::<Value>("headers/", "tok1", RequestOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn fetch_page_sends_page_parameters() {
    let client = api_client(&serve(router()).await);
    let page: Paginated<Value> = client
        .fetch_page("assets/", "tok1", PageQuery::new(3, 25))
        .await
        .unwrap();
    assert_eq!(page.count, 42);
    assert_eq!(page.results[0]["page"], 3);
    assert_eq!(page.results[0]["page_size"], "25");
}
