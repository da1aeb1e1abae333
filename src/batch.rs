//! Batch orchestration
//!
//! Each element is validated, encoded and scored on its own. A bad element
//! becomes an error entry at its own index; it never fails the batch and
//! never shifts later entries. Elements are scored in parallel on the rayon
//! pool and collected back in input order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{inference::Prediction, service::ServiceContext, validate};

/// One entry of a batch response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchItem {
    /// Element scored successfully
    Success {
        /// Position in the request list
        index: usize,
        /// Prediction fields, inlined
        #[serde(flatten)]
        prediction: Prediction,
        /// Element as submitted
        input_data: Value,
    },
    /// Element rejected or failed to score
    Failure {
        /// Position in the request list
        index: usize,
        /// Error message
        error: String,
        /// Element as submitted
        input_data: Value,
    },
}

impl BatchItem {
    /// Position in the request list
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Success { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    /// Whether the element was scored
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Batch response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// One entry per input element, in input order
    pub results: Vec<BatchItem>,
    /// Number of input elements
    pub total_predictions: usize,
    /// Number of elements scored successfully
    pub successful_predictions: usize,
    /// Total fallback encodings across successful elements
    #[serde(skip)]
    pub fallback_encodings: usize,
}

/// Score every element of a batch
#[must_use]
pub fn run_batch(context: &ServiceContext, data: &[Value]) -> BatchOutcome {
    let scored: Vec<(BatchItem, usize)> = data
        .par_iter()
        .enumerate()
        .map(|(index, element)| score_element(context, index, element))
        .collect();

    let fallback_encodings: usize = scored.iter().map(|(_, f)| f).sum();
    let results: Vec<BatchItem> = scored.into_iter().map(|(item, _)| item).collect();
    let successful_predictions = results.iter().filter(|r| r.is_success()).count();

    debug!(
        total = results.len(),
        successful = successful_predictions,
        "Batch scored"
    );

    BatchOutcome {
        total_predictions: results.len(),
        successful_predictions,
        fallback_encodings,
        results,
    }
}

fn score_element(context: &ServiceContext, index: usize, element: &Value) -> (BatchItem, usize) {
    let scored =
        validate::require_batch_element(element).and_then(|record| context.predict(record));
    match scored {
        Ok(scored) => (
            BatchItem::Success {
                index,
                prediction: scored.prediction,
                input_data: element.clone(),
            },
            scored.fallbacks.len(),
        ),
        Err(e) => (
            BatchItem::Failure {
                index,
                error: e.to_string(),
                input_data: element.clone(),
            },
            0,
        ),
    }
}
