//! Feature encoder: raw JSON record to model input vector
//!
//! The output row always follows [`FEATURE_COLUMNS`], whatever the key order
//! of the incoming JSON. Categorical columns go through their vocabulary;
//! numeric columns pass through unchanged.
//!
//! An unseen category does not fail the request. It encodes as code 0 and is
//! recorded in [`EncodedRecord::fallbacks`] so callers can count it, but the
//! prediction response itself does not reveal it.

use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    error::{AarogyaError, Result},
    schema::{FeatureVector, FEATURE_COLUMNS, LOCATION, NUM_FEATURES, WEEK},
    validate,
    vocab::{CategoryCode, CategoryVocabulary},
};

/// A record encoded for scoring
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    /// Values in [`FEATURE_COLUMNS`] order
    pub features: FeatureVector,
    /// Categorical columns whose value was unseen and fell back to code 0
    pub fallbacks: Vec<&'static str>,
}

impl EncodedRecord {
    /// Whether any categorical column used the fallback code
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        !self.fallbacks.is_empty()
    }
}

/// Encoder holding the read-only `Week` and `Location` vocabularies
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    week: CategoryVocabulary,
    location: CategoryVocabulary,
}

impl FeatureEncoder {
    /// Create an encoder from the two training vocabularies
    #[must_use]
    pub fn new(week: CategoryVocabulary, location: CategoryVocabulary) -> Self {
        Self { week, location }
    }

    /// `Week` vocabulary
    #[must_use]
    pub fn week(&self) -> &CategoryVocabulary {
        &self.week
    }

    /// `Location` vocabulary
    #[must_use]
    pub fn location(&self) -> &CategoryVocabulary {
        &self.location
    }

    /// Encode one record
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::MissingFields`] if any required field is absent
    /// (checked before anything is encoded) and
    /// [`AarogyaError::InvalidFeature`] if a value has an unusable type.
    pub fn encode(&self, record: &Map<String, Value>) -> Result<EncodedRecord> {
        validate::require_fields(record)?;

        let mut features = [0.0; NUM_FEATURES];
        let mut fallbacks = Vec::new();

        for (slot, column) in features.iter_mut().zip(FEATURE_COLUMNS) {
            let value = &record[column];
            *slot = match column {
                WEEK | LOCATION => {
                    let vocab = if column == WEEK {
                        &self.week
                    } else {
                        &self.location
                    };
                    let code = encode_category(vocab, column, value)?;
                    if code.is_fallback() {
                        fallbacks.push(column);
                    }
                    f64::from(code.code())
                },
                _ => numeric(column, value)?,
            };
        }

        Ok(EncodedRecord {
            features,
            fallbacks,
        })
    }
}

fn encode_category(
    vocab: &CategoryVocabulary,
    column: &'static str,
    value: &Value,
) -> Result<CategoryCode> {
    let token = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            return Err(AarogyaError::invalid_feature(
                column,
                "expected a string category",
            ))
        },
    };

    let code = vocab.encode(&token);
    if code.is_fallback() {
        warn!(
            column,
            value = %token,
            fallback = vocab.fallback_category().unwrap_or_default(),
            "Unseen category, using fallback code 0"
        );
    }
    Ok(code)
}

fn numeric(column: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| AarogyaError::invalid_feature(column, "expected a number"))
}
