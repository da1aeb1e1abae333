//! API request/response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::inference::Prediction;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Whether the classifier is loaded
    pub model_loaded: bool,
    /// Whether the category vocabularies are loaded
    pub encoders_loaded: bool,
    /// Number of known locations
    pub available_locations: usize,
    /// Number of known weeks
    pub available_weeks: usize,
    /// RFC 3339 time of the check
    pub timestamp: String,
    /// Deployment environment label
    pub environment: String,
}

/// Single prediction response
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Label, confidence and probabilities
    #[serde(flatten)]
    pub prediction: Prediction,
    /// Request body as received
    pub input_data: Value,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Absent required fields, in column order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
}

impl ErrorResponse {
    /// Error without field details
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            missing_fields: None,
        }
    }
}
