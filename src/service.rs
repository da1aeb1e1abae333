//! Service context: everything a request needs, built once at startup
//!
//! A [`ServiceContext`] owns the classifier and the encoder. It is immutable
//! after construction and handed to handlers behind an `Arc`; there is no
//! process-wide state and no partially loaded mode. Either every piece loads
//! and checks out, or construction fails.

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::{
    classifier::{BoostedTrees, Classifier},
    corpus::TrainingCorpus,
    encoder::FeatureEncoder,
    error::{AarogyaError, Result},
    fixtures,
    inference::{self, Prediction},
    schema::{DISEASE_LABELS, FEATURE_COLUMNS},
    validate,
    vocab::CategoryVocabulary,
};

/// Discovery payload served by `/info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Known `Location` values, sorted
    pub available_locations: Vec<String>,
    /// Known `Week` values, sorted
    pub available_weeks: Vec<String>,
    /// Labels the classifier can return, in training order
    pub possible_predictions: Vec<String>,
    /// Required input fields, in model column order
    pub model_features: Vec<String>,
}

/// A scored record plus the categorical columns that fell back
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    /// Client-facing prediction
    pub prediction: Prediction,
    /// Columns encoded with the fallback code
    pub fallbacks: Vec<&'static str>,
}

/// Immutable bundle of classifier and vocabularies
#[derive(Clone)]
pub struct ServiceContext {
    classifier: Arc<dyn Classifier>,
    encoder: FeatureEncoder,
    model_source: String,
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("labels", &self.classifier.labels())
            .field("known_locations", &self.encoder.location().len())
            .field("known_weeks", &self.encoder.week().len())
            .field("model_source", &self.model_source)
            .finish()
    }
}

impl ServiceContext {
    /// Load the model artifact and rebuild vocabularies from the corpus
    ///
    /// # Errors
    ///
    /// Fails if either file is missing or unusable, or if the artifact does
    /// not match the serving schema.
    pub fn load(model_path: impl AsRef<Path>, corpus_path: impl AsRef<Path>) -> Result<Self> {
        let model_path = model_path.as_ref();
        let corpus_path = corpus_path.as_ref();

        let model = BoostedTrees::load(model_path)?;
        let corpus = TrainingCorpus::load(corpus_path)?;
        info!(
            model = %model_path.display(),
            trees = model.num_trees(),
            corpus = %corpus_path.display(),
            rows = corpus.rows(),
            "Loaded model artifact and training corpus"
        );

        let (week, location) = corpus.into_vocabularies();
        Self::from_parts(
            Arc::new(model),
            week,
            location,
            model_path.display().to_string(),
        )
    }

    /// Assemble a context from already-loaded parts
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::InvalidModel`] if the classifier's feature
    /// layout or label order differs from the serving schema, and
    /// [`AarogyaError::CorpusError`] if a vocabulary is empty.
    pub fn from_parts(
        classifier: Arc<dyn Classifier>,
        week: CategoryVocabulary,
        location: CategoryVocabulary,
        model_source: impl Into<String>,
    ) -> Result<Self> {
        if classifier.feature_names() != FEATURE_COLUMNS {
            return Err(AarogyaError::InvalidModel(format!(
                "feature_names {:?} do not match required columns {:?}",
                classifier.feature_names(),
                FEATURE_COLUMNS
            )));
        }
        if classifier.labels() != DISEASE_LABELS {
            return Err(AarogyaError::InvalidModel(format!(
                "labels {:?} do not match training order {:?}",
                classifier.labels(),
                DISEASE_LABELS
            )));
        }
        for vocab in [&week, &location] {
            if vocab.is_empty() {
                return Err(AarogyaError::CorpusError(format!(
                    "empty vocabulary for '{}'",
                    vocab.column()
                )));
            }
        }

        Ok(Self {
            classifier,
            encoder: FeatureEncoder::new(week, location),
            model_source: model_source.into(),
        })
    }

    /// Context backed by the built-in demo bundle
    ///
    /// # Errors
    ///
    /// Only fails if the demo bundle itself is inconsistent.
    pub fn demo() -> Result<Self> {
        let model = fixtures::demo_classifier()?;
        let csv = fixtures::demo_corpus_csv()?;
        let (week, location) = TrainingCorpus::from_reader(csv.as_bytes())?.into_vocabularies();
        Self::from_parts(Arc::new(model), week, location, "demo")
    }

    /// Shared classifier
    #[must_use]
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Feature encoder
    #[must_use]
    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Where the model came from (a path, or `demo`)
    #[must_use]
    pub fn model_source(&self) -> &str {
        &self.model_source
    }

    /// Class labels, in training order
    #[must_use]
    pub fn labels(&self) -> &[String] {
        self.classifier.labels()
    }

    /// Known locations, sorted
    #[must_use]
    pub fn known_locations(&self) -> &[String] {
        self.encoder.location().categories()
    }

    /// Known weeks, sorted
    #[must_use]
    pub fn known_weeks(&self) -> &[String] {
        self.encoder.week().categories()
    }

    /// `/info` payload
    #[must_use]
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            available_locations: self.known_locations().to_vec(),
            available_weeks: self.known_weeks().to_vec(),
            possible_predictions: self.labels().to_vec(),
            model_features: FEATURE_COLUMNS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Encode and score one record
    ///
    /// # Errors
    ///
    /// Client errors for missing or mistyped fields; an
    /// [`AarogyaError::InferenceError`] if scoring fails.
    pub fn predict(&self, record: &Map<String, Value>) -> Result<Scored> {
        let encoded = self.encoder.encode(record)?;
        let prediction = inference::score(self.classifier(), &encoded).inspect_err(|e| {
            error!(error = %e, "Scoring failed");
        })?;
        Ok(Scored {
            prediction,
            fallbacks: encoded.fallbacks,
        })
    }

    /// Validate a raw single-prediction body, then predict
    ///
    /// # Errors
    ///
    /// See [`validate::require_record`] and [`ServiceContext::predict`].
    pub fn predict_value(&self, body: &Value) -> Result<Scored> {
        let record = validate::require_record(body)?;
        self.predict(record)
    }
}
