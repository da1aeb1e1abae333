//! Inference executor
//!
//! Scores an encoded record and shapes the result into a [`Prediction`].
//! The classifier is only ever borrowed, so any number of requests can score
//! against the same instance at once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    classifier::Classifier,
    encoder::EncodedRecord,
    error::{AarogyaError, Result},
};

/// Allowed distance of a probability vector's sum from 1.0
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Outcome of scoring one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Label with the highest probability
    pub prediction: String,
    /// Probability of `prediction`
    pub confidence: f64,
    /// Probability for every label
    pub probabilities: BTreeMap<String, f64>,
}

/// Index of the first maximal value
///
/// Ties resolve to the lowest index, i.e. the label that comes first in
/// training order. Returns `None` for an empty slice.
#[must_use]
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {},
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Score an encoded record
///
/// # Errors
///
/// Returns [`AarogyaError::InferenceError`] if the classifier fails or
/// returns something that is not a probability distribution over its labels.
pub fn score(classifier: &dyn Classifier, encoded: &EncodedRecord) -> Result<Prediction> {
    let labels = classifier.labels();
    let probs = classifier
        .predict_proba(&encoded.features)
        .map_err(|e| match e {
            AarogyaError::InferenceError(_) => e,
            other => AarogyaError::InferenceError(other.to_string()),
        })?;

    check_distribution(labels.len(), &probs)?;

    let best = argmax_first(&probs)
        .ok_or_else(|| AarogyaError::InferenceError("empty probability vector".to_string()))?;

    Ok(Prediction {
        prediction: labels[best].clone(),
        confidence: probs[best],
        probabilities: labels.iter().cloned().zip(probs.iter().copied()).collect(),
    })
}

fn check_distribution(num_labels: usize, probs: &[f64]) -> Result<()> {
    if probs.len() != num_labels {
        return Err(AarogyaError::InferenceError(format!(
            "classifier returned {} probabilities for {} labels",
            probs.len(),
            num_labels
        )));
    }
    if let Some(p) = probs
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(AarogyaError::InferenceError(format!(
            "probability {p} is outside [0, 1]"
        )));
    }
    let sum: f64 = probs.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(AarogyaError::InferenceError(format!(
            "probabilities sum to {sum}, expected 1"
        )));
    }
    Ok(())
}
