//! Feature schema shared by training artifacts and the serving path
//!
//! The column order here is the order the classifier was trained on. The
//! encoder, the artifact loader and the `/info` endpoint all read it from this
//! module so the three can never drift apart.

/// Number of model input features
pub const NUM_FEATURES: usize = 9;

/// ISO-week-like token, e.g. `2025-W25`
pub const WEEK: &str = "Week";
/// Place name, e.g. `Karol Bagh`
pub const LOCATION: &str = "Location";

/// Model input columns, in training order
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    WEEK,
    LOCATION,
    "NDVI",
    "WaterIndex",
    "Rainfall_mm",
    "Humidity_pct",
    "FeverCases",
    "Absenteeism_pct",
    "ToiletUsage_pct",
];

/// Columns encoded through a category vocabulary
pub const CATEGORICAL_COLUMNS: [&str; 2] = [WEEK, LOCATION];

/// Disease labels in training-time index order
///
/// The label encoder sorted class names alphabetically, so index 0 is
/// `Dengue`. Argmax ties resolve to the lowest index in this order.
pub const DISEASE_LABELS: [&str; 4] = ["Dengue", "Healthy", "Malaria", "Typhoid"];

/// One encoded row, ready for scoring
pub type FeatureVector = [f64; NUM_FEATURES];

/// Position of a column in [`FEATURE_COLUMNS`]
#[must_use]
pub fn column_index(name: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|c| *c == name)
}

/// Whether the column is encoded through a vocabulary
#[must_use]
pub fn is_categorical(name: &str) -> bool {
    CATEGORICAL_COLUMNS.contains(&name)
}
