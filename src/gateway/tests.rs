//! Gateway tests against a live in-process inference service

use std::{collections::HashSet, net::SocketAddr, time::Duration};

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use super::*;
use crate::api::{create_router, AppState};

const TOKEN: &str = "test-token";

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("test");
    let addr = listener.local_addr().expect("test");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test");
    });
    addr
}

async fn spawn_inference_service() -> SocketAddr {
    spawn(create_router(AppState::demo().expect("test"))).await
}

/// An address nothing listens on
async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("test");
    listener.local_addr().expect("test")
}

fn gateway(addr: SocketAddr, timeouts: UpstreamTimeouts) -> Router {
    let upstream = UpstreamClient::new(&format!("http://{addr}/"), timeouts).expect("test");
    create_gateway_router(GatewayState::new(upstream, [TOKEN.to_string()]))
}

async fn call(
    app: Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Body,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    let response = app
        .oneshot(builder.body(body).expect("test"))
        .await
        .expect("test");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("test");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn record() -> Value {
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

fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

#[test]
fn test_authorize_schemes() {
    let tokens: HashSet<String> = [TOKEN.to_string()].into_iter().collect();
    let check = |value: Option<&str>| {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert("authorization", HeaderValue::from_str(v).expect("test"));
        }
        authorize(&headers, &tokens)
    };

    assert_eq!(check(Some("Bearer test-token")), Ok(()));
    assert_eq!(check(Some("Token test-token")), Ok(()));
    assert_eq!(check(Some("bearer test-token")), Ok(()));
    assert_eq!(check(None), Err(CREDENTIALS_NOT_PROVIDED));
    assert_eq!(check(Some("Basic dXNlcjpwYXNz")), Err(CREDENTIALS_NOT_PROVIDED));
    assert_eq!(check(Some("Bearer")), Err(NO_CREDENTIALS_IN_HEADER));
    assert_eq!(check(Some("Bearer wrong")), Err(INVALID_TOKEN));
    assert_eq!(check(Some("Bearer test-token extra")), Err(INVALID_TOKEN));
}

#[test]
fn test_from_config_validates() {
    let config = GatewayConfig::default();
    assert!(GatewayState::from_config(&config).is_err());

    let config = GatewayConfig {
        upstream_url: "http://localhost:5001/".to_string(),
        tokens: vec![TOKEN.to_string()],
        ..GatewayConfig::default()
    };
    let state = GatewayState::from_config(&config).expect("test");
    assert_eq!(state.upstream().base_url(), "http://localhost:5001");
    assert_eq!(state.upstream().timeouts(), UpstreamTimeouts::default());
}

#[tokio::test]
async fn test_gateway_health_is_local() {
    let app = gateway(closed_addr().await, UpstreamTimeouts::default());
    let (status, json) = call(app, "GET", "/api/health", None, Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["message"], "AarogyaRekha API is running");
}

#[tokio::test]
async fn test_predict_requires_credentials() {
    let app = gateway(spawn_inference_service().await, UpstreamTimeouts::default());

    let (status, json) = call(
        app.clone(),
        "POST",
        "/api/predict",
        None,
        Body::from(record().to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], CREDENTIALS_NOT_PROVIDED);

    let (status, json) = call(
        app,
        "POST",
        "/api/predict",
        Some("Bearer nope"),
        Body::from(record().to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], INVALID_TOKEN);
}

#[tokio::test]
async fn test_predict_is_forwarded_verbatim() {
    let addr = spawn_inference_service().await;
    let app = gateway(addr, UpstreamTimeouts::default());

    let (status, json) = call(
        app,
        "POST",
        "/api/predict",
        Some(&bearer()),
        Body::from(record().to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["prediction"], "Healthy");
    assert_eq!(json["input_data"], record());

    let direct = reqwest::Client::new()
        .post(format!("http://{addr}/predict"))
        .body(record().to_string())
        .send()
        .await
        .expect("test")
        .bytes()
        .await
        .expect("test");
    let direct: Value = serde_json::from_slice(&direct).expect("test");
    assert_eq!(json, direct);
}

#[tokio::test]
async fn test_upstream_validation_error_becomes_503() {
    let app = gateway(spawn_inference_service().await, UpstreamTimeouts::default());
    let (status, json) = call(
        app,
        "POST",
        "/api/predict",
        Some(&bearer()),
        Body::from(json!({"Week": "2025-W25"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], SERVICE_UNAVAILABLE);
    let details: Value =
        serde_json::from_str(json["details"].as_str().expect("test")).expect("test");
    assert_eq!(details["missing_fields"].as_array().map(Vec::len), Some(8));
}

#[tokio::test]
async fn test_batch_is_forwarded() {
    let app = gateway(spawn_inference_service().await, UpstreamTimeouts::default());
    let body = json!({"data": [record(), {}]});
    let (status, json) = call(
        app,
        "POST",
        "/api/predict/batch",
        Some(&format!("Token {TOKEN}")),
        Body::from(body.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_predictions"], 2);
    assert_eq!(json["successful_predictions"], 1);
}

#[tokio::test]
async fn test_info_is_forwarded() {
    let app = gateway(spawn_inference_service().await, UpstreamTimeouts::default());

    let (status, _) = call(app.clone(), "GET", "/api/predict/info", None, Body::empty()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = call(app, "GET", "/api/predict/info", Some(&bearer()), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available_locations"].as_array().map(Vec::len), Some(10));
}

#[tokio::test]
async fn test_prediction_health_needs_no_auth() {
    let app = gateway(spawn_inference_service().await, UpstreamTimeouts::default());
    let (status, json) = call(app, "GET", "/api/predict/health", None, Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["prediction_service"]["status"], "healthy");
    assert_eq!(json["prediction_service"]["available_locations"], 10);
}

#[tokio::test]
async fn test_unreachable_upstream_is_503() {
    let app = gateway(closed_addr().await, UpstreamTimeouts::default());

    let (status, json) = call(
        app.clone(),
        "POST",
        "/api/predict",
        Some(&bearer()),
        Body::from(record().to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], CONNECT_FAILED);
    assert!(json["details"].is_string());

    let (status, json) = call(app, "GET", "/api/predict/health", None, Body::empty()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unhealthy");
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let slow = Router::new()
        .route(
            "/predict",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        )
        .route(
            "/health",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        );
    let addr = spawn(slow).await;
    let timeouts = UpstreamTimeouts {
        predict: Duration::from_millis(100),
        health: Duration::from_millis(100),
        ..UpstreamTimeouts::default()
    };
    let app = gateway(addr, timeouts);

    let (status, json) = call(
        app.clone(),
        "POST",
        "/api/predict",
        Some(&bearer()),
        Body::from(record().to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], CONNECT_FAILED);
    assert!(json["details"]
        .as_str()
        .expect("test")
        .contains("timed out after 100 ms"));

    let (status, json) = call(app, "GET", "/api/predict/health", None, Body::empty()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unhealthy");
}

#[tokio::test]
async fn test_upstream_error_status_on_health() {
    let broken = Router::new().route(
        "/health",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
    );
    let app = gateway(spawn(broken).await, UpstreamTimeouts::default());
    let (status, json) = call(app, "GET", "/api/predict/health", None, Body::empty()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "Prediction service returned 500");
}

#[tokio::test]
async fn test_unknown_gateway_route_is_404() {
    let app = gateway(closed_addr().await, UpstreamTimeouts::default());
    let (status, json) = call(app, "GET", "/api/unknown", Some(&bearer()), Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], NOT_FOUND);
}
