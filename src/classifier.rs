//! Trained classifier: a softmax gradient-boosted tree ensemble
//!
//! The artifact is plain JSON so it can be produced by any offline trainer
//! and diffed in review:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "feature_names": ["Week", "Location", "NDVI", "..."],
//!   "labels": ["Dengue", "Healthy", "Malaria", "Typhoid"],
//!   "base_score": 0.5,
//!   "trees": [
//!     {
//!       "class": 1,
//!       "nodes": [
//!         {"split": {"feature": 6, "threshold": 10.0, "left": 1, "right": 2}},
//!         {"leaf": {"value": 1.5}},
//!         {"leaf": {"value": -0.6}}
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Semantics follow multi-class XGBoost (`multi:softprob`):
//! - each tree contributes to exactly one class margin
//! - a split sends the row left when `x[feature] < threshold`
//! - class margin = `base_score` + sum of that class's leaf values
//! - probabilities = softmax over class margins
//!
//! The model is immutable once loaded and scoring takes `&self`, so one
//! instance is shared by every in-flight request.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{AarogyaError, Result};

/// Artifact format this build understands
pub const FORMAT_VERSION: u32 = 1;

/// A multi-class probabilistic classifier over a fixed feature layout
pub trait Classifier: Send + Sync {
    /// Input feature names, in the order `predict_proba` expects them
    fn feature_names(&self) -> &[String];

    /// Class labels; index `i` of the probability vector belongs to `labels()[i]`
    fn labels(&self) -> &[String];

    /// Score one feature vector into a per-class probability vector
    ///
    /// # Errors
    ///
    /// Returns an error if the vector has the wrong length or scoring fails.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;
}

/// One node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Internal node: `x[feature] < threshold` goes left
    Split {
        /// Feature index into the input vector
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Node index taken when the comparison holds
        left: usize,
        /// Node index taken otherwise
        right: usize,
    },
    /// Terminal node
    Leaf {
        /// Margin contribution
        value: f64,
    },
}

impl Node {
    /// Internal node helper
    #[must_use]
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    /// Leaf helper
    #[must_use]
    pub fn leaf(value: f64) -> Self {
        Self::Leaf { value }
    }
}

/// A single regression tree attached to one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Index into the ensemble's labels
    pub class: usize,
    /// Nodes; index 0 is the root
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Create a tree for `class`
    #[must_use]
    pub fn new(class: usize, nodes: Vec<Node>) -> Self {
        Self { class, nodes }
    }

    /// Walk from the root to a leaf and return its value
    ///
    /// Assumes the tree passed [`BoostedTrees::validate`]: children always
    /// point forward, so the walk terminates.
    fn leaf_value(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                },
            }
        }
    }
}

/// Softmax gradient-boosted tree ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTrees {
    /// Artifact format version
    pub format_version: u32,
    /// Input feature names, in scoring order
    pub feature_names: Vec<String>,
    /// Class labels, in training index order
    pub labels: Vec<String>,
    /// Initial margin for every class
    pub base_score: f64,
    /// Boosted trees across all rounds and classes
    pub trees: Vec<Tree>,
}

impl BoostedTrees {
    /// Assemble and validate an ensemble
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::InvalidModel`] if the ensemble is inconsistent.
    pub fn new(
        feature_names: Vec<String>,
        labels: Vec<String>,
        base_score: f64,
        trees: Vec<Tree>,
    ) -> Result<Self> {
        let model = Self {
            format_version: FORMAT_VERSION,
            feature_names,
            labels,
            base_score,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    /// Load and validate an artifact from disk
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::IoError`] if the file cannot be read,
    /// [`AarogyaError::FormatError`] if it is not a valid artifact document,
    /// and [`AarogyaError::InvalidModel`] if it violates a structural invariant.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| AarogyaError::IoError {
            message: format!("Failed to read model artifact {}: {e}", path.display()),
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate an artifact document
    ///
    /// # Errors
    ///
    /// Same as [`BoostedTrees::load`], minus I/O.
    pub fn from_json(raw: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(raw).map_err(|e| AarogyaError::FormatError {
            reason: format!("Failed to parse model artifact: {e}"),
        })?;
        model.validate()?;
        Ok(model)
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::FormatError`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AarogyaError::FormatError {
            reason: format!("Failed to serialize model artifact: {e}"),
        })
    }

    /// Check every structural invariant scoring relies on
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::InvalidModel`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(AarogyaError::InvalidModel(format!(
                "unsupported format_version {} (expected {FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.labels.is_empty() {
            return Err(AarogyaError::InvalidModel("no class labels".to_string()));
        }
        for (i, label) in self.labels.iter().enumerate() {
            if self.labels[..i].contains(label) {
                return Err(AarogyaError::InvalidModel(format!(
                    "duplicate class label '{label}'"
                )));
            }
        }
        if !self.base_score.is_finite() {
            return Err(AarogyaError::InvalidModel(
                "base_score is not finite".to_string(),
            ));
        }

        let num_features = self.feature_names.len();
        let num_classes = self.labels.len();

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(AarogyaError::InvalidModel(format!("tree {t} has no nodes")));
            }
            if tree.class >= num_classes {
                return Err(AarogyaError::InvalidModel(format!(
                    "tree {t} targets class {} but only {num_classes} labels exist",
                    tree.class
                )));
            }
            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Leaf { value } if !value.is_finite() => {
                        return Err(AarogyaError::InvalidModel(format!(
                            "tree {t} node {n}: leaf value is not finite"
                        )));
                    },
                    Node::Leaf { .. } => {},
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= num_features {
                            return Err(AarogyaError::InvalidModel(format!(
                                "tree {t} node {n}: feature {feature} out of range ({num_features} features)"
                            )));
                        }
                        if threshold.is_nan() {
                            return Err(AarogyaError::InvalidModel(format!(
                                "tree {t} node {n}: threshold is NaN"
                            )));
                        }
                        for child in [*left, *right] {
                            if child <= n || child >= tree.nodes.len() {
                                return Err(AarogyaError::InvalidModel(format!(
                                    "tree {t} node {n}: child {child} must point forward within {} nodes",
                                    tree.nodes.len()
                                )));
                            }
                        }
                    },
                }
            }
        }
        Ok(())
    }

    /// Number of trees in the ensemble
    #[must_use]
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw per-class margins before softmax
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::DataShapeMismatch`] on a wrong-length input.
    pub fn margins(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.feature_names.len() {
            return Err(AarogyaError::DataShapeMismatch {
                expected: self.feature_names.len(),
                actual: features.len(),
            });
        }
        let mut margins = vec![self.base_score; self.labels.len()];
        for tree in &self.trees {
            margins[tree.class] += tree.leaf_value(features);
        }
        Ok(margins)
    }
}

impl Classifier for BoostedTrees {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        let margins = self.margins(features)?;
        if let Some(i) = features.iter().position(|x| !x.is_finite()) {
            return Err(AarogyaError::InferenceError(format!(
                "feature {} ('{}') is not finite",
                i, self.feature_names[i]
            )));
        }
        Ok(softmax(&margins))
    }
}

/// Numerically stable softmax
#[must_use]
pub fn softmax(margins: &[f64]) -> Vec<f64> {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
