//! Test helper functions for api tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use super::*;

/// Create a test application with demo state
pub fn create_test_app() -> Router {
    let state = AppState::demo().expect("test");
    create_router(state)
}

/// A complete record that the demo model scores as `Healthy`
pub fn healthy_record() -> Value {
    json!({
        "Week": "2025-W25",
        "Location": "Karol Bagh",
        "NDVI": 0.7,
        "WaterIndex": 0.8,
        "Rainfall_mm": 5.0,
        "Humidity_pct": 50.0,
        "FeverCases": 3,
        "Absenteeism_pct": 2.0,
        "ToiletUsage_pct": 90.0
    })
}

/// Send a request and return status plus parsed JSON body
pub async fn send(app: Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .expect("test"),
        )
        .await
        .expect("test");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("test");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// POST a JSON value
pub async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Body::from(body.to_string())).await
}

/// GET a path
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, Body::empty()).await
}
