//! HTTP API integration tests
//!
//! Runs the router in-process with no upstreams configured, so every
//! source is simulated from a fixed seed.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use papallacta_backend::config::{
    Config, GenerativeConfig, PipelineConfig, PredictionConfig, ServerConfig, SourcesConfig,
};
use papallacta_backend::{build_state, create_app};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        prediction: PredictionConfig::default(),
        generative: GenerativeConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            api_key: None,
            model: "test-model".to_string(),
        },
        sources: SourcesConfig::default(),
        pipeline: PipelineConfig {
            noise_seed: Some(7),
            ..PipelineConfig::default()
        },
    }
}

fn app() -> Router {
    create_app(build_state(test_config()).unwrap())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_daily_forecast_is_complete() {
    let (status, body) = send(app(), get("/api/v1/forecast/daily")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "daily");
    assert_eq!(body["outcome"], "complete");
    assert_eq!(body["forecast"].as_array().unwrap().len(), 7);
    assert_eq!(body["sources"]["primary_model"], false);
    assert_eq!(body["sources"]["refinement"], false);
    // base score only: simulated primary and simulated snapshots
    assert!((body["confidence"].as_f64().unwrap() - 0.30).abs() < 1e-9);
    assert_eq!(body["forecast"][0]["source"], "simulated");
}

#[tokio::test]
async fn test_unknown_period_is_rejected_in_both_languages() {
    let (status, body) = send(app(), get("/api/v1/forecast/weekly")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PERIOD");
    assert!(body["error"]["message_es"].as_str().is_some());
}

#[tokio::test]
async fn test_refresh_and_alerts() {
    let (status, body) = send(app(), post_json("/api/v1/forecast/yearly/refresh", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forecast"].as_array().unwrap().len(), 12);

    let (status, body) = send(app(), get("/api/v1/forecast/monthly/alerts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "monthly");
    assert!(body["alerts"].is_array());
}

#[tokio::test]
async fn test_classify_endpoint() {
    let series: Vec<Value> = [5.0, 10.0, 22.0, 38.0, 8.0, 0.0, 30.0]
        .iter()
        .enumerate()
        .map(|(i, p)| json!({"date": format!("2024-04-{:02}", 21 + i), "precipitation": p}))
        .collect();
    let (status, body) = send(app(), post_json("/api/v1/alerts/classify", json!({ "series": series }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["severities"],
        json!(["normal", "normal", "warning", "critical", "normal", "normal", "warning"])
    );
    assert_eq!(body["alerts"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_classify_rejects_unordered_series() {
    let series = json!([
        {"date": "2024-04-22", "precipitation": 1.0},
        {"date": "2024-04-21", "precipitation": 1.0}
    ]);
    let (status, body) = send(app(), post_json("/api/v1/alerts/classify", json!({ "series": series }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "series");
}

#[tokio::test]
async fn test_sources_are_simulated_without_upstreams() {
    let (status, body) = send(app(), get("/api/v1/sources")).await;

    assert_eq!(status, StatusCode::OK);
    let snapshots = body.as_array().unwrap();
    assert_eq!(snapshots.len(), 3);
    assert!(snapshots.iter().all(|s| s["provenance"] == "simulated"));
    assert_eq!(snapshots[0]["source"], "weather");
}

#[tokio::test]
async fn test_seasonal_table_and_health() {
    let (status, body) = send(app(), get("/api/v1/seasonal")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 12);
    assert_eq!(body[3]["precipitationMm"], 8.9);

    let (status, body) = send(app(), get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["prediction_model"], "not_configured");
}
