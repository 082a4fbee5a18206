use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use cluster_dashboard::{
    api::{router, AppState},
    config::Config,
    metrics,
    provider::{MetricsProvider, MockProvider},
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app() -> Router {
    let config = Config {
        mock_delay: Duration::ZERO,
        mock_seed: Some(42),
        ..Config::default()
    };
    let provider: Arc<dyn MetricsProvider> = Arc::new(MockProvider::from_config(&config));
    router(AppState::new(provider, &config))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, bytes) = send(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn put_time_range(app: &Router, range: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("PUT")
        .uri("/api/v1/dashboard/time-range")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "timeRange": range }).to_string()))
        .unwrap();
    let (status, bytes) = send(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_check() {
    let app = app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, bytes) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"ok");
}

#[test_log::test(tokio::test)]
async fn settled_dashboard() {
    let app = app();
    let (status, view) = get_json(&app, "/api/v1/dashboard?wait=true").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["loading"], false);
    assert_eq!(view["errors"], json!([]));

    let donut = &view["overview"]["podStatus"];
    assert_eq!(donut["total"], 190.0);
    assert_eq!(donut["centerLabel"], "190");
    assert_eq!(donut["slices"].as_array().unwrap().len(), 4);

    assert_eq!(view["overview"]["memory"]["percentageLabel"], "55.3%");
    assert_eq!(view["overview"]["cpu"]["overLimit"], false);

    assert_eq!(view["usage"]["timeRange"], "15m");
    assert_eq!(view["usage"]["cpu"]["data"].as_array().unwrap().len(), 16);
    assert_eq!(view["usage"]["cpu"]["series"].as_array().unwrap().len(), 3);

    let rows = view["pods"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3]["podName"], "database-connector-f9g0h1i2-z3y4x");
    assert_eq!(rows[3]["restartBadge"], "destructive");
    assert_eq!(rows[3]["lastDeployed"], "10 days ago");
}

#[tokio::test]
async fn time_range_change_restarts_range_queries() {
    let app = app();
    get_json(&app, "/api/v1/dashboard?wait=true").await;

    let (status, view) = put_time_range(&app, "30m").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(view["usage"]["timeRange"], "30m");

    let (_, view) = get_json(&app, "/api/v1/dashboard?wait=true").await;
    assert_eq!(view["usage"]["cpu"]["data"].as_array().unwrap().len(), 31);
    assert_eq!(view["usage"]["memory"]["data"].as_array().unwrap().len(), 31);

    let (status, _) = put_time_range(&app, "30m").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_time_range_is_rejected() {
    let app = app();
    let (status, body) = put_time_range(&app, "forever").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid time range: forever");
}

#[tokio::test]
async fn unknown_query_is_not_found() {
    let app = app();
    let (status, body) = get_json(&app, "/api/v1/query/does_not_exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No data found for query: does_not_exist");
}

#[tokio::test]
async fn range_query_payload() {
    let app = app();
    let (status, body) = get_json(&app, "/api/v1/query/pod_memory_usage_range?range=15m").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projectId"], 1);
    assert_eq!(body["data"]["resultType"], "matrix");

    let result = body["data"]["result"].as_array().unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result[0]["metric"]["pod"], "frontend-api-6b7b8c9c-x4v2f");
    assert_eq!(result[0]["values"].as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn refresh_is_accepted() {
    let app = app();
    get_json(&app, "/api/v1/dashboard?wait=true").await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/dashboard/refresh")
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = send(&app, req).await;
    let view: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(view["loading"], true);
}

#[tokio::test]
async fn prometheus_exposition() {
    metrics::init_metrics();
    let app = app();
    get_json(&app, "/api/v1/query/cpu_limit").await;

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, bytes) = send(&app, req).await;
    let text = String::from_utf8(bytes).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("dashboard_up 1"));
}
