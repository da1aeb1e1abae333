//! Training corpus reader
//!
//! The serving path never retrains. It reads the original training CSV only to
//! rebuild the `Week` and `Location` vocabularies exactly as they were at
//! training time. The file is still checked end to end: a corpus that is
//! missing a column, has no rows, or carries garbage in a numeric column is
//! rejected, because vocabularies built from it could not be trusted.

use std::{fs::File, io::Read, path::Path};

use crate::{
    error::{AarogyaError, Result},
    schema::{self, FEATURE_COLUMNS, LOCATION, WEEK},
    vocab::CategoryVocabulary,
};

/// Vocabularies and statistics recovered from a training corpus
#[derive(Debug, Clone)]
pub struct TrainingCorpus {
    rows: usize,
    week: CategoryVocabulary,
    location: CategoryVocabulary,
}

impl TrainingCorpus {
    /// Read a corpus from a CSV file
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::IoError`] if the file cannot be opened and
    /// [`AarogyaError::CorpusError`] if its content is unusable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AarogyaError::IoError {
            message: format!("Failed to open corpus {}: {e}", path.display()),
        })?;
        Self::from_reader(file).map_err(|e| match e {
            AarogyaError::CorpusError(reason) => {
                AarogyaError::CorpusError(format!("{}: {reason}", path.display()))
            },
            other => other,
        })
    }

    /// Read a corpus from any CSV source with a header row
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::CorpusError`] on malformed CSV, a missing
    /// feature column, an empty categorical cell, a non-numeric value in a
    /// numeric column, or zero data rows.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        // Cells are kept verbatim: padded categories are distinct vocabulary entries
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = csv
            .headers()
            .map_err(|e| AarogyaError::CorpusError(format!("unreadable header: {e}")))?
            .clone();

        let mut positions = [0usize; schema::NUM_FEATURES];
        for (slot, column) in positions.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| AarogyaError::CorpusError(format!("missing column '{column}'")))?;
        }

        let mut weeks = Vec::new();
        let mut locations = Vec::new();

        for (row, record) in csv.records().enumerate() {
            // Header is line 1
            let line = row + 2;
            let record = record
                .map_err(|e| AarogyaError::CorpusError(format!("line {line}: {e}")))?;

            for (&pos, column) in positions.iter().zip(FEATURE_COLUMNS) {
                let cell = record.get(pos).unwrap_or_default();
                if schema::is_categorical(column) {
                    if cell.is_empty() {
                        return Err(AarogyaError::CorpusError(format!(
                            "line {line}: empty value in '{column}'"
                        )));
                    }
                } else if cell.trim().parse::<f64>().is_err() {
                    return Err(AarogyaError::CorpusError(format!(
                        "line {line}: non-numeric value '{cell}' in '{column}'"
                    )));
                }
            }

            weeks.push(record.get(positions[0]).unwrap_or_default().to_string());
            locations.push(record.get(positions[1]).unwrap_or_default().to_string());
        }

        if weeks.is_empty() {
            return Err(AarogyaError::CorpusError("no data rows".to_string()));
        }

        Ok(Self {
            rows: weeks.len(),
            week: CategoryVocabulary::fit(WEEK, weeks),
            location: CategoryVocabulary::fit(LOCATION, locations),
        })
    }

    /// Number of data rows read
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Vocabulary of the `Week` column
    #[must_use]
    pub fn week(&self) -> &CategoryVocabulary {
        &self.week
    }

    /// Vocabulary of the `Location` column
    #[must_use]
    pub fn location(&self) -> &CategoryVocabulary {
        &self.location
    }

    /// Split into the two vocabularies
    #[must_use]
    pub fn into_vocabularies(self) -> (CategoryVocabulary, CategoryVocabulary) {
        (self.week, self.location)
    }
}
