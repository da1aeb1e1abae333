//! Authenticating proxy in front of the inference service
//!
//! ## Endpoints
//!
//! | Route | Auth | Upstream |
//! |---|---|---|
//! | `GET /api/health` | no | answered locally |
//! | `POST /api/predict` | yes | `POST /predict` |
//! | `POST /api/predict/batch` | yes | `POST /predict/batch` |
//! | `GET /api/predict/info` | yes | `GET /info` |
//! | `GET /api/predict/health` | no | `GET /health` |
//!
//! Bodies pass through untouched in both directions. Anything other than an
//! upstream `200` becomes a `503`, and nothing is retried.

use std::{collections::HashSet, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{
    api::{ErrorResponse, MAX_BODY_BYTES, NOT_FOUND},
    config::{GatewayConfig, UpstreamTimeouts},
    error::{AarogyaError, Result},
};

#[cfg(test)]
mod tests;

/// Error for upstream non-200 answers
pub const SERVICE_UNAVAILABLE: &str = "Prediction service unavailable";
/// Error for connection failures and timeouts
pub const CONNECT_FAILED: &str = "Failed to connect to prediction service";
/// Error for requests without usable credentials
pub const CREDENTIALS_NOT_PROVIDED: &str = "Authentication credentials were not provided.";
/// Error for an authorization header with a scheme but no token
pub const NO_CREDENTIALS_IN_HEADER: &str = "Invalid token header. No credentials provided.";
/// Error for an unknown token
pub const INVALID_TOKEN: &str = "Invalid token.";

/// Gateway-level error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error message
    pub error: String,
    /// Upstream body or connection failure detail
    pub details: String,
}

/// Body of `GET /api/predict/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionHealth {
    /// `healthy` or `unhealthy`
    pub status: String,
    /// Upstream health document, when reachable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_service: Option<Value>,
    /// Why the upstream is considered unhealthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayHealth {
    /// Always `ok`
    pub status: String,
    /// Human-readable banner
    pub message: String,
}

/// Async HTTP client for the inference service
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    timeouts: UpstreamTimeouts,
}

impl UpstreamClient {
    /// Create a client for `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::InvalidConfiguration`] if the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, timeouts: UpstreamTimeouts) -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            AarogyaError::InvalidConfiguration(format!("Failed to create HTTP client: {e}"))
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeouts,
        })
    }

    /// Upstream base URL, without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configured deadlines
    #[must_use]
    pub fn timeouts(&self) -> UpstreamTimeouts {
        self.timeouts
    }

    /// Forward a single-prediction body
    ///
    /// # Errors
    ///
    /// See [`UpstreamClient::call`].
    pub async fn predict(&self, body: Bytes) -> Result<Bytes> {
        self.call(reqwest::Method::POST, "/predict", Some(body), self.timeouts.predict)
            .await
    }

    /// Forward a batch body
    ///
    /// # Errors
    ///
    /// See [`UpstreamClient::call`].
    pub async fn predict_batch(&self, body: Bytes) -> Result<Bytes> {
        self.call(
            reqwest::Method::POST,
            "/predict/batch",
            Some(body),
            self.timeouts.batch,
        )
        .await
    }

    /// Fetch the discovery document
    ///
    /// # Errors
    ///
    /// See [`UpstreamClient::call`].
    pub async fn info(&self) -> Result<Bytes> {
        self.call(reqwest::Method::GET, "/info", None, self.timeouts.info)
            .await
    }

    /// Fetch the upstream health document
    ///
    /// # Errors
    ///
    /// See [`UpstreamClient::call`].
    pub async fn health(&self) -> Result<Bytes> {
        self.call(reqwest::Method::GET, "/health", None, self.timeouts.health)
            .await
    }

    /// Send one request and return the body of a `200` answer
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::ConnectionError`] if the request cannot be
    /// completed within `timeout`, and [`AarogyaError::UpstreamStatus`] for
    /// any status other than `200`.
    pub async fn call(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Bytes>,
        timeout: Duration,
    ) -> Result<Bytes> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.request(method, &url).timeout(timeout);
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE.as_str(), "application/json")
                .body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| connection_error(&e, timeout))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| connection_error(&e, timeout))?;

        if status != reqwest::StatusCode::OK {
            return Err(AarogyaError::UpstreamStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes)
    }
}

fn connection_error(e: &reqwest::Error, timeout: Duration) -> AarogyaError {
    if e.is_timeout() {
        AarogyaError::ConnectionError(format!(
            "Request timed out after {} ms",
            timeout.as_millis()
        ))
    } else {
        AarogyaError::ConnectionError(format!("HTTP request failed: {e}"))
    }
}

/// Gateway state shared across handlers
#[derive(Clone)]
pub struct GatewayState {
    upstream: Arc<UpstreamClient>,
    tokens: Arc<HashSet<String>>,
}

impl GatewayState {
    /// Create state from an upstream client and the accepted tokens
    pub fn new(upstream: UpstreamClient, tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            upstream: Arc::new(upstream),
            tokens: Arc::new(tokens.into_iter().collect()),
        }
    }

    /// Build state from a validated config
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::InvalidConfiguration`] if the config is invalid
    /// or the HTTP client cannot be built.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        let upstream = UpstreamClient::new(&config.upstream_url, config.timeouts)?;
        Ok(Self::new(upstream, config.tokens.iter().cloned()))
    }

    /// Upstream client
    #[must_use]
    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }
}

/// Create the gateway router
pub fn create_gateway_router(state: GatewayState) -> Router {
    let protected = Router::new()
        .route("/api/predict", post(predict_handler))
        .route("/api/predict/batch", post(batch_handler))
        .route("/api/predict/info", get(info_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/api/health", get(gateway_health_handler))
        .route("/api/predict/health", get(prediction_health_handler))
        .merge(protected)
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Check an `Authorization` header against the accepted tokens
///
/// Accepts `Bearer <token>` and `Token <token>`; the scheme is
/// case-insensitive.
///
/// # Errors
///
/// Returns the client-facing rejection message.
pub fn authorize(
    headers: &HeaderMap,
    tokens: &HashSet<String>,
) -> std::result::Result<(), &'static str> {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Err(CREDENTIALS_NOT_PROVIDED);
    };

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or_default();
    if !(scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token")) {
        return Err(CREDENTIALS_NOT_PROVIDED);
    }
    let Some(token) = parts.next() else {
        return Err(NO_CREDENTIALS_IN_HEADER);
    };
    if parts.next().is_some() || !tokens.contains(token) {
        return Err(INVALID_TOKEN);
    }
    Ok(())
}

async fn require_token(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    match authorize(request.headers(), &state.tokens) {
        Ok(()) => next.run(request).await,
        Err(message) => {
            warn!(
                path = %request.uri().path(),
                reason = message,
                "Rejected unauthenticated request"
            );
            (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message))).into_response()
        },
    }
}

/// Turn an upstream result into the gateway response
fn relay(route: &str, result: Result<Bytes>) -> Response {
    match result {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(route, error = %e, "Upstream call failed");
            let body = match e {
                AarogyaError::UpstreamStatus { body, .. } => GatewayError {
                    error: SERVICE_UNAVAILABLE.to_string(),
                    details: body,
                },
                other => GatewayError {
                    error: CONNECT_FAILED.to_string(),
                    details: other.to_string(),
                },
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        },
    }
}

async fn predict_handler(State(state): State<GatewayState>, body: Bytes) -> Response {
    relay("/api/predict", state.upstream.predict(body).await)
}

async fn batch_handler(State(state): State<GatewayState>, body: Bytes) -> Response {
    relay("/api/predict/batch", state.upstream.predict_batch(body).await)
}

async fn info_handler(State(state): State<GatewayState>) -> Response {
    relay("/api/predict/info", state.upstream.info().await)
}

async fn gateway_health_handler() -> Json<GatewayHealth> {
    Json(GatewayHealth {
        status: "ok".to_string(),
        message: "AarogyaRekha API is running".to_string(),
    })
}

async fn prediction_health_handler(
    State(state): State<GatewayState>,
) -> (StatusCode, Json<PredictionHealth>) {
    let upstream = state.upstream.health().await.and_then(|body| {
        serde_json::from_slice::<Value>(&body).map_err(|e| AarogyaError::FormatError {
            reason: format!("Prediction service returned invalid JSON: {e}"),
        })
    });

    match upstream {
        Ok(document) => (
            StatusCode::OK,
            Json(PredictionHealth {
                status: "healthy".to_string(),
                prediction_service: Some(document),
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Prediction service health check failed");
            let error = match e {
                AarogyaError::UpstreamStatus { status, .. } => {
                    format!("Prediction service returned {status}")
                },
                other => other.to_string(),
            };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(PredictionHealth {
                    status: "unhealthy".to_string(),
                    prediction_service: None,
                    error: Some(error),
                }),
            )
        },
    }
}

async fn not_found_handler() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(NOT_FOUND)))
}
