//! Request validation
//!
//! Shape checks that run before any encoding. Nothing here defaults a missing
//! value: a record that lacks a required field is rejected with the full list
//! of what is missing.

use serde_json::{Map, Value};

use crate::{
    error::{AarogyaError, Result},
    schema::FEATURE_COLUMNS,
};

/// Message for an empty or absent request body
pub const NO_DATA: &str = "No data provided";
/// Message for a batch body without a `data` member
pub const NO_BATCH_DATA: &str = "No data provided or missing 'data' field";
/// Message for a batch `data` member that is not an array
pub const BATCH_NOT_LIST: &str = "Data must be a list";
/// Message for a record that is not a JSON object
pub const NOT_AN_OBJECT: &str = "Record must be a JSON object";

/// Required fields absent from `record`, in feature-column order
#[must_use]
pub fn missing_fields(record: &Map<String, Value>) -> Vec<String> {
    FEATURE_COLUMNS
        .iter()
        .filter(|field| !record.contains_key(**field))
        .map(|field| (*field).to_string())
        .collect()
}

/// Check that a record carries every required field
///
/// # Errors
///
/// Returns [`AarogyaError::MissingFields`] listing each absent field.
pub fn require_fields(record: &Map<String, Value>) -> Result<()> {
    let missing = missing_fields(record);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AarogyaError::MissingFields(missing))
    }
}

/// Validate a single-prediction request body
///
/// `null` and `{}` count as no data at all.
///
/// # Errors
///
/// Returns [`AarogyaError::InvalidRequest`] for an empty or non-object body
/// and [`AarogyaError::MissingFields`] for an incomplete record.
pub fn require_record(body: &Value) -> Result<&Map<String, Value>> {
    match body {
        Value::Null => Err(AarogyaError::InvalidRequest(NO_DATA.to_string())),
        Value::Object(map) if map.is_empty() => {
            Err(AarogyaError::InvalidRequest(NO_DATA.to_string()))
        },
        Value::Object(map) => {
            require_fields(map)?;
            Ok(map)
        },
        _ => Err(AarogyaError::InvalidRequest(NOT_AN_OBJECT.to_string())),
    }
}

/// Validate one element of a batch
///
/// Unlike [`require_record`], an empty object is reported as missing all
/// nine fields.
///
/// # Errors
///
/// Same kinds as [`require_record`].
pub fn require_batch_element(element: &Value) -> Result<&Map<String, Value>> {
    match element {
        Value::Object(map) => {
            require_fields(map)?;
            Ok(map)
        },
        _ => Err(AarogyaError::InvalidRequest(NOT_AN_OBJECT.to_string())),
    }
}

/// Validate a batch request body and return its `data` list
///
/// # Errors
///
/// Returns [`AarogyaError::InvalidRequest`] if `data` is absent or not a list.
pub fn require_batch(body: &Value) -> Result<&[Value]> {
    let data = body
        .as_object()
        .and_then(|map| map.get("data"))
        .ok_or_else(|| AarogyaError::InvalidRequest(NO_BATCH_DATA.to_string()))?;

    data.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| AarogyaError::InvalidRequest(BATCH_NOT_LIST.to_string()))
}
