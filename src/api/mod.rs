//! HTTP API for disease-risk inference
//!
//! ## Endpoints
//!
//! - `GET /health` - Health and readiness probe
//! - `GET /info` - Known locations and weeks, labels, required fields
//! - `GET /metrics` - Prometheus-formatted metrics
//! - `POST /predict` - Score one record
//! - `POST /predict/batch` - Score a list of records with per-element errors
//!
//! Any other path answers `404 {"error": "Endpoint not found"}`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use aarogya::api::{create_router, AppState};
//!
//! let state = AppState::demo()?;
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

use std::{sync::Arc, time::Instant};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{error, warn};

use crate::{
    batch::{self, BatchOutcome},
    error::{AarogyaError, Result},
    metrics::MetricsCollector,
    service::{ModelInfo, ServiceContext},
    validate,
};

mod types;
pub use types::*;

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "disease-prediction-ml";

/// Largest accepted request body (16 MiB)
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Message for unknown routes
pub const NOT_FOUND: &str = "Endpoint not found";

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Classifier and vocabularies, read-only
    context: Arc<ServiceContext>,
    /// Metrics collector for monitoring
    metrics: Arc<MetricsCollector>,
    /// Deployment environment label
    environment: Arc<str>,
}

impl AppState {
    /// Create state around a loaded service context
    pub fn new(context: ServiceContext, environment: impl Into<String>) -> Self {
        Self {
            context: Arc::new(context),
            metrics: Arc::new(MetricsCollector::new()),
            environment: Arc::from(environment.into()),
        }
    }

    /// State backed by the built-in demo bundle
    ///
    /// # Errors
    ///
    /// Only fails if the demo bundle is inconsistent.
    pub fn demo() -> Result<Self> {
        Ok(Self::new(ServiceContext::demo()?, "development"))
    }

    /// Service context
    #[must_use]
    pub fn context(&self) -> &ServiceContext {
        &self.context
    }

    /// Metrics collector
    #[must_use]
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Environment label
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }
}

/// Create the inference service router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/metrics", get(metrics_handler))
        .route("/predict", post(predict_handler))
        .route("/predict/batch", post(batch_predict_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Map a crate error to an HTTP error response
///
/// Client errors become `400`; everything else is `500`.
pub fn error_response(err: &AarogyaError) -> (StatusCode, Json<ErrorResponse>) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            missing_fields: err.missing_fields().map(<[String]>::to_vec),
        }),
    )
}

/// Parse a request body; blank bodies read as JSON `null`
fn parse_body(body: &Bytes) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| AarogyaError::InvalidRequest(format!("Invalid JSON: {e}")))
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let context = state.context();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: crate::VERSION.to_string(),
        model_loaded: true,
        encoders_loaded: true,
        available_locations: context.known_locations().len(),
        available_weeks: context.known_weeks().len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: state.environment().to_string(),
    })
}

/// Info handler - discovery of valid inputs
async fn info_handler(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.context().info())
}

/// Metrics handler - returns Prometheus-formatted metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.to_prometheus()
}

/// Single prediction handler
async fn predict_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Json<PredictResponse>, ApiError> {
    let start = Instant::now();

    let outcome = parse_body(&body).and_then(|input| {
        let scored = state.context().predict_value(&input)?;
        Ok((scored, input))
    });

    match outcome {
        Ok((scored, input_data)) => {
            state
                .metrics
                .record_success(1, scored.fallbacks.len(), start.elapsed());
            Ok(Json(PredictResponse {
                prediction: scored.prediction,
                input_data,
            }))
        },
        Err(e) => {
            state.metrics.record_failure();
            if e.is_client_error() {
                warn!(error = %e, "Rejected prediction request");
            } else {
                error!(error = %e, "Prediction failed");
            }
            Err(error_response(&e))
        },
    }
}

/// Batch prediction handler
///
/// Elements are scored on the blocking pool so a large batch does not stall
/// the async workers.
async fn batch_predict_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Json<BatchOutcome>, ApiError> {
    let start = Instant::now();

    let data = parse_body(&body)
        .and_then(|input| validate::require_batch(&input).map(<[Value]>::to_vec))
        .map_err(|e| {
            state.metrics.record_failure();
            warn!(error = %e, "Rejected batch request");
            error_response(&e)
        })?;

    let context = Arc::clone(&state.context);
    let outcome = tokio::task::spawn_blocking(move || batch::run_batch(&context, &data))
        .await
        .map_err(|e| {
            state.metrics.record_failure();
            error!(error = %e, "Batch worker failed");
            error_response(&AarogyaError::InferenceError(format!(
                "batch worker failed: {e}"
            )))
        })?;

    state.metrics.record_success(
        outcome.successful_predictions,
        outcome.fallback_encodings,
        start.elapsed(),
    );
    state
        .metrics
        .record_failures(outcome.total_predictions - outcome.successful_predictions);

    Ok(Json(outcome))
}

/// Fallback for unknown routes
async fn not_found_handler() -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(NOT_FOUND)))
}
