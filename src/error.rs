//! Error types for Aarogya
//!
//! A single error enum covers the whole serving path. Variants split into two
//! families: client errors (the request was malformed and the caller can fix
//! it) and internal errors (artifact, corpus, scoring or upstream failures).
//! The HTTP layers map the first family to `400` and the rest to `500`/`503`.

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, AarogyaError>;

/// Error type for every Aarogya operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AarogyaError {
    /// One or more of the required feature fields is absent
    ///
    /// Field names are listed in feature-column order.
    #[error("Missing required fields: {0:?}")]
    MissingFields(Vec<String>),

    /// Request body has the wrong shape (empty, not an object, no `data` list)
    #[error("{0}")]
    InvalidRequest(String),

    /// A present field carries a value the encoder cannot use
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidFeature {
        /// Offending field name
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The classifier failed or produced an unusable distribution
    #[error("Inference failed: {0}")]
    InferenceError(String),

    /// Feature vector length differs from what the classifier expects
    #[error("Feature vector has {actual} values, classifier expects {expected}")]
    DataShapeMismatch {
        /// Expected number of features
        expected: usize,
        /// Number of features supplied
        actual: usize,
    },

    /// Filesystem error while reading an artifact or corpus
    #[error("I/O error: {message}")]
    IoError {
        /// Description including the path involved
        message: String,
    },

    /// Model artifact could not be parsed
    #[error("Model format error: {reason}")]
    FormatError {
        /// Parse failure detail
        reason: String,
    },

    /// Model artifact parsed but violates a structural invariant
    #[error("Invalid model artifact: {0}")]
    InvalidModel(String),

    /// Training corpus is unreadable or inconsistent
    #[error("Corpus error: {0}")]
    CorpusError(String),

    /// Configuration value rejected at startup
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Upstream service could not be reached or timed out
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Upstream service answered with a non-success status
    #[error("Upstream returned HTTP {status}")]
    UpstreamStatus {
        /// HTTP status code returned by the upstream
        status: u16,
        /// Raw upstream response body
        body: String,
    },
}

impl AarogyaError {
    /// Whether the error is attributable to the caller's input
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFields(_) | Self::InvalidRequest(_) | Self::InvalidFeature { .. }
        )
    }

    /// Missing field names, when this is a missing-fields error
    #[must_use]
    pub fn missing_fields(&self) -> Option<&[String]> {
        match self {
            Self::MissingFields(fields) => Some(fields),
            _ => None,
        }
    }

    pub(crate) fn invalid_feature(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFeature {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
