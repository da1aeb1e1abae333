//! Demo bundle: a small hand-built ensemble and a matching corpus
//!
//! The trees encode the headline disease rules (heavy rain with fever cases
//! points to Dengue, stagnant water over sparse vegetation to Malaria, humid
//! weeks with poor sanitation to Typhoid, low fever and absenteeism to
//! Healthy). Two shallow trees split on `Week` and `Location` so that the
//! categorical codes, and therefore the fallback code, move the output.
//!
//! Everything here is deterministic; the corpus is generated, not sampled.

use std::path::{Path, PathBuf};

use crate::{
    classifier::{BoostedTrees, Node, Tree},
    config::{DEFAULT_CORPUS_PATH, DEFAULT_MODEL_PATH},
    error::{AarogyaError, Result},
    schema::{DISEASE_LABELS, FEATURE_COLUMNS},
};

const WEEK: usize = 0;
const LOCATION: usize = 1;
const NDVI: usize = 2;
const WATER_INDEX: usize = 3;
const RAINFALL: usize = 4;
const HUMIDITY: usize = 5;
const FEVER: usize = 6;
const ABSENTEEISM: usize = 7;
const TOILET_USAGE: usize = 8;

const DENGUE: usize = 0;
const HEALTHY: usize = 1;
const MALARIA: usize = 2;
const TYPHOID: usize = 3;

const LOCATIONS: [&str; 10] = [
    "Karol Bagh",
    "Dwarka",
    "Seelampur",
    "Chanakyapuri",
    "Najafgarh",
    "Greater Kailash",
    "Rohini",
    "Saket",
    "Shahdara",
    "Vasant Kunj",
];

const FIRST_WEEK: u32 = 20;
const LAST_WEEK: u32 = 40;

/// Demo ensemble over the standard feature layout
///
/// # Errors
///
/// Only fails if the hand-built trees break an ensemble invariant.
pub fn demo_classifier() -> Result<BoostedTrees> {
    let trees = vec![
        Tree::new(
            DENGUE,
            vec![
                Node::split(RAINFALL, 50.0, 1, 2),
                Node::leaf(-0.5),
                Node::split(FEVER, 15.0, 3, 4),
                Node::leaf(-0.2),
                Node::leaf(1.2),
            ],
        ),
        Tree::new(
            HEALTHY,
            vec![
                Node::split(FEVER, 10.0, 1, 2),
                Node::split(ABSENTEEISM, 5.0, 3, 4),
                Node::leaf(-0.6),
                Node::leaf(1.5),
                Node::leaf(0.3),
            ],
        ),
        Tree::new(
            MALARIA,
            vec![
                Node::split(WATER_INDEX, 0.6, 1, 2),
                Node::leaf(-0.4),
                Node::split(NDVI, 0.4, 3, 4),
                Node::leaf(1.2),
                Node::leaf(0.0),
            ],
        ),
        Tree::new(
            TYPHOID,
            vec![
                Node::split(HUMIDITY, 70.0, 1, 2),
                Node::leaf(-0.4),
                Node::split(TOILET_USAGE, 80.0, 3, 4),
                Node::leaf(1.0),
                Node::leaf(-0.1),
            ],
        ),
        // Codes 0..=2 are Chanakyapuri, Dwarka, Greater Kailash
        Tree::new(
            DENGUE,
            vec![
                Node::split(LOCATION, 3.0, 1, 2),
                Node::leaf(0.1),
                Node::leaf(-0.1),
            ],
        ),
        // Code 8 is 2025-W28, start of the monsoon weeks
        Tree::new(
            MALARIA,
            vec![
                Node::split(WEEK, 8.0, 1, 2),
                Node::leaf(-0.05),
                Node::leaf(0.05),
            ],
        ),
    ];

    BoostedTrees::new(
        FEATURE_COLUMNS.iter().map(ToString::to_string).collect(),
        DISEASE_LABELS.iter().map(ToString::to_string).collect(),
        0.5,
        trees,
    )
}

/// Locations in the demo corpus, in corpus order
#[must_use]
pub fn demo_locations() -> Vec<String> {
    LOCATIONS.iter().map(ToString::to_string).collect()
}

/// Week tokens in the demo corpus, `2025-W20` through `2025-W40`
#[must_use]
pub fn demo_weeks() -> Vec<String> {
    (FIRST_WEEK..=LAST_WEEK)
        .map(|w| format!("2025-W{w:02}"))
        .collect()
}

/// Demo corpus as CSV text, one row per location and week
///
/// The trailing `Disease` column is the demo classifier's own prediction for
/// the row. Loaders ignore it.
///
/// # Errors
///
/// Returns [`AarogyaError::CorpusError`] if the CSV writer fails.
pub fn demo_corpus_csv() -> Result<String> {
    use crate::classifier::Classifier;

    let model = demo_classifier()?;
    let weeks = demo_weeks();
    let locations = demo_locations();

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header: Vec<&str> = FEATURE_COLUMNS.to_vec();
    header.push("Disease");
    writer.write_record(&header).map_err(csv_error)?;

    for (i, location) in locations.iter().enumerate() {
        for (w, week) in weeks.iter().enumerate() {
            let ndvi = 0.3 + 0.05 * ((i * 3 + w) % 10) as f64;
            let water = 0.2 + 0.07 * ((i + w * 2) % 11) as f64;
            let rain = ((w * 17 + i * 7) % 120) as f64 + 0.5;
            let humidity = 45.0 + ((w * 5 + i * 3) % 45) as f64;
            let fever = ((w * 3 + i * 5) % 30) as f64;
            let absenteeism = 1.0 + ((w + i * 2) % 20) as f64;
            let toilet = 60.0 + ((i * 7 + w) % 40) as f64;

            let row = [
                sorted_code(&weeks, week),
                sorted_code(&locations, location),
                ndvi,
                water,
                rain,
                humidity,
                fever,
                absenteeism,
                toilet,
            ];
            let probs = model.predict_proba(&row)?;
            let label = crate::inference::argmax_first(&probs)
                .map_or(DISEASE_LABELS[HEALTHY], |k| DISEASE_LABELS[k]);

            writer
                .write_record([
                    week.clone(),
                    location.clone(),
                    format!("{ndvi:.2}"),
                    format!("{water:.2}"),
                    format!("{rain:.1}"),
                    format!("{humidity:.1}"),
                    format!("{fever}"),
                    format!("{absenteeism:.1}"),
                    format!("{toilet:.1}"),
                    label.to_string(),
                ])
                .map_err(csv_error)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AarogyaError::CorpusError(format!("failed to flush demo corpus: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| AarogyaError::CorpusError(format!("demo corpus is not UTF-8: {e}")))
}

/// Write the demo artifact and corpus into `dir` under their default names
///
/// Returns the model and corpus paths.
///
/// # Errors
///
/// Returns [`AarogyaError::IoError`] if `dir` cannot be created or written.
pub fn write_demo_artifacts(dir: impl AsRef<Path>) -> Result<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    let io_error = |path: &Path, e: std::io::Error| AarogyaError::IoError {
        message: format!("Failed to write {}: {e}", path.display()),
    };

    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    let model_path = dir.join(DEFAULT_MODEL_PATH);
    let corpus_path = dir.join(DEFAULT_CORPUS_PATH);
    std::fs::write(&model_path, demo_classifier()?.to_json_pretty()?)
        .map_err(|e| io_error(&model_path, e))?;
    std::fs::write(&corpus_path, demo_corpus_csv()?).map_err(|e| io_error(&corpus_path, e))?;
    Ok((model_path, corpus_path))
}

/// Code a vocabulary fitted on `values` would give `value`
fn sorted_code(values: &[String], value: &str) -> f64 {
    let mut sorted: Vec<&str> = values.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.iter().position(|s| *s == value).unwrap_or(0) as f64
}

fn csv_error(e: csv::Error) -> AarogyaError {
    AarogyaError::CorpusError(format!("failed to write demo corpus: {e}"))
}
