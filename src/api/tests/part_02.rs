//! Single prediction endpoint

use axum::{body::Body, http::StatusCode};
use serde_json::{json, Value};

use crate::api::test_helpers::*;
use crate::schema::{DISEASE_LABELS, FEATURE_COLUMNS};
use crate::validate::{NOT_AN_OBJECT, NO_DATA};

#[tokio::test]
async fn test_predict_end_to_end_healthy() {
    let (status, json) = post_json(create_test_app(), "/predict", &healthy_record()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["prediction"], "Healthy");
    assert_eq!(json["input_data"], healthy_record());

    let probs = json["probabilities"].as_object().expect("test");
    assert_eq!(probs.len(), 4);
    for label in DISEASE_LABELS {
        assert!(probs.contains_key(label), "missing {label}");
    }
    let sum: f64 = probs.values().filter_map(Value::as_f64).sum();
    assert!((sum - 1.0).abs() < 1e-6);

    let confidence = json["confidence"].as_f64().expect("test");
    assert_eq!(Some(confidence), probs["Healthy"].as_f64());
}

#[tokio::test]
async fn test_predict_each_missing_field_is_400() {
    for field in FEATURE_COLUMNS {
        let mut record = healthy_record();
        record.as_object_mut().expect("test").remove(field);

        let (status, json) = post_json(create_test_app(), "/predict", &record).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(json["missing_fields"], json!([field]));
        assert!(json["error"]
            .as_str()
            .expect("test")
            .starts_with("Missing required fields"));
    }
}

#[tokio::test]
async fn test_predict_missing_fields_listed_in_column_order() {
    let record = json!({"ToiletUsage_pct": 85.0, "Location": "Dwarka", "NDVI": 0.5});
    let (status, json) = post_json(create_test_app(), "/predict", &record).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["missing_fields"],
        json!([
            "Week",
            "WaterIndex",
            "Rainfall_mm",
            "Humidity_pct",
            "FeverCases",
            "Absenteeism_pct"
        ])
    );
}

#[tokio::test]
async fn test_predict_no_data() {
    for body in [Body::empty(), Body::from("null"), Body::from("{}"), Body::from("  ")] {
        let (status, json) = send(create_test_app(), "POST", "/predict", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": NO_DATA}));
    }
}

#[tokio::test]
async fn test_predict_invalid_json() {
    let (status, json) = send(
        create_test_app(),
        "POST",
        "/predict",
        Body::from("{\"Week\": "),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().expect("test").starts_with("Invalid JSON"));
}

#[tokio::test]
async fn test_predict_non_object() {
    let (status, json) = post_json(create_test_app(), "/predict", &json!([1, 2, 3])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], NOT_AN_OBJECT);
}

#[tokio::test]
async fn test_predict_invalid_numeric_value() {
    let mut record = healthy_record();
    record["Humidity_pct"] = json!("humid");
    let (status, json) = post_json(create_test_app(), "/predict", &record).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().expect("test").contains("Humidity_pct"));
}

#[tokio::test]
async fn test_predict_unknown_location_is_deterministic() {
    let mut record = healthy_record();
    record["Location"] = json!("Invalid Location");

    let (status, first) = post_json(create_test_app(), "/predict", &record).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = post_json(create_test_app(), "/predict", &record).await;
    assert_eq!(first["probabilities"], second["probabilities"]);
    assert!(first.get("fallback").is_none());

    record["Location"] = json!("Chanakyapuri");
    let (_, code_zero) = post_json(create_test_app(), "/predict", &record).await;
    assert_eq!(first["probabilities"], code_zero["probabilities"]);
    assert_eq!(first["prediction"], code_zero["prediction"]);
}

#[tokio::test]
async fn test_predict_key_order_does_not_matter() {
    let forward = healthy_record().to_string();
    let reversed = r#"{"ToiletUsage_pct": 90.0, "Absenteeism_pct": 2.0, "FeverCases": 3,
        "Humidity_pct": 50.0, "Rainfall_mm": 5.0, "WaterIndex": 0.8, "NDVI": 0.7,
        "Location": "Karol Bagh", "Week": "2025-W25"}"#;

    let (_, a) = send(create_test_app(), "POST", "/predict", Body::from(forward)).await;
    let (_, b) = send(create_test_app(), "POST", "/predict", Body::from(reversed)).await;
    assert_eq!(a["probabilities"], b["probabilities"]);
}

#[tokio::test]
async fn test_predict_echoes_extra_fields() {
    let mut record = healthy_record();
    record["note"] = json!("field visit");
    let (status, json) = post_json(create_test_app(), "/predict", &record).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["input_data"]["note"], "field visit");
}
