//! Category vocabularies for categorical feature columns
//!
//! A vocabulary maps each distinct training value of a column to a small
//! integer code. Codes are assigned by sorting the distinct values, so the
//! same corpus always yields the same mapping, and that mapping must be the one
//! the classifier was trained against.
//!
//! Values that never appeared during training are not an error. They encode
//! as [`CategoryCode::Fallback`], which scores as code
//! [`CategoryCode::FALLBACK_CODE`] (the first vocabulary entry).

use std::collections::HashMap;

/// Result of looking a raw value up in a vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryCode {
    /// Value seen during training, with its assigned code
    Known(u32),
    /// Unseen value, scored as [`CategoryCode::FALLBACK_CODE`]
    Fallback,
}

impl CategoryCode {
    /// Code substituted for values absent from the vocabulary
    pub const FALLBACK_CODE: u32 = 0;

    /// Numeric code fed to the classifier
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Known(code) => code,
            Self::Fallback => Self::FALLBACK_CODE,
        }
    }

    /// Whether the lookup missed and the fallback code was used
    #[must_use]
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// Immutable value-to-code mapping for one categorical column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVocabulary {
    column: String,
    categories: Vec<String>,
    codes: HashMap<String, u32>,
}

impl CategoryVocabulary {
    /// Build a vocabulary from every value observed in a column
    ///
    /// Duplicates collapse; codes follow sorted order.
    pub fn fit<I, S>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut categories: Vec<String> = values.into_iter().map(Into::into).collect();
        categories.sort_unstable();
        categories.dedup();

        let codes = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i as u32))
            .collect();

        Self {
            column: column.to_string(),
            categories,
            codes,
        }
    }

    /// Column this vocabulary encodes
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Distinct categories, sorted (index == code)
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of distinct categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether no category was observed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Exact code for a known value
    #[must_use]
    pub fn code(&self, value: &str) -> Option<u32> {
        self.codes.get(value).copied()
    }

    /// Look a raw value up, falling back for unseen values
    #[must_use]
    pub fn encode(&self, value: &str) -> CategoryCode {
        self.code(value)
            .map_or(CategoryCode::Fallback, CategoryCode::Known)
    }

    /// Category that the fallback code stands for, if any
    #[must_use]
    pub fn fallback_category(&self) -> Option<&str> {
        self.categories
            .get(CategoryCode::FALLBACK_CODE as usize)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations() -> CategoryVocabulary {
        CategoryVocabulary::fit(
            "Location",
            ["Karol Bagh", "Dwarka", "Seelampur", "Dwarka", "Chanakyapuri"],
        )
    }

    #[test]
    fn test_fit_sorts_and_dedups() {
        let vocab = locations();
        assert_eq!(vocab.column(), "Location");
        assert_eq!(
            vocab.categories(),
            &["Chanakyapuri", "Dwarka", "Karol Bagh", "Seelampur"]
        );
        assert_eq!(vocab.len(), 4);
        assert!(!vocab.is_empty());
    }

    #[test]
    fn test_codes_follow_sorted_position() {
        let vocab = locations();
        assert_eq!(vocab.code("Chanakyapuri"), Some(0));
        assert_eq!(vocab.code("Dwarka"), Some(1));
        assert_eq!(vocab.code("Karol Bagh"), Some(2));
        assert_eq!(vocab.code("Seelampur"), Some(3));
    }

    #[test]
    fn test_unknown_value_falls_back_to_code_zero() {
        let vocab = locations();
        let code = vocab.encode("Invalid Location");
        assert_eq!(code, CategoryCode::Fallback);
        assert!(code.is_fallback());
        assert_eq!(code.code(), 0);
        assert_eq!(code.code(), vocab.encode("Chanakyapuri").code());
        assert_eq!(vocab.fallback_category(), Some("Chanakyapuri"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let vocab = locations();
        assert!(vocab.encode("karol bagh").is_fallback());
        assert_eq!(vocab.encode("Karol Bagh"), CategoryCode::Known(2));
    }

    #[test]
    fn test_week_tokens_sort_lexically() {
        let vocab = CategoryVocabulary::fit("Week", ["2025-W10", "2025-W9", "2024-W52"]);
        assert_eq!(vocab.categories(), &["2024-W52", "2025-W10", "2025-W9"]);
    }

    #[test]
    fn test_empty_vocabulary() {
        let vocab = CategoryVocabulary::fit("Week", Vec::<String>::new());
        assert!(vocab.is_empty());
        assert_eq!(vocab.fallback_category(), None);
        assert_eq!(vocab.encode("2025-W01").code(), 0);
    }

    #[test]
    fn test_fit_is_order_independent() {
        let a = CategoryVocabulary::fit("Location", ["b", "a", "c"]);
        let b = CategoryVocabulary::fit("Location", ["c", "b", "a", "a"]);
        assert_eq!(a, b);
    }
}
