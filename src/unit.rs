//! Annotated text units.
//!
//! A [`TextUnit`] is one line or phrase of an annotated text: its locus
//! reference, ordered surface tokens, and the lemma (dictionary headword)
//! for each token. Units are produced by an upstream annotation provider and
//! are immutable once constructed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IntertextError, Result};
use crate::language::Language;

/// Identifies a unit within a corpus: `(text_id, unit_index)`.
pub type UnitId = (u32, usize);

/// One annotated line or phrase of a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Locus reference, e.g. `"1.12"` or `"aen. 1.1"`.
    pub locus: String,
    /// Ordered surface forms.
    pub tokens: Vec<String>,
    /// Dictionary headwords, one per token. Entries may be empty placeholders
    /// where the annotator produced no lemma.
    pub lemmas: Vec<String>,
    /// Optional part-of-speech tags, one per token.
    pub pos_tags: Option<Vec<String>>,
}

impl TextUnit {
    /// Create a unit, enforcing `tokens.len() == lemmas.len()` and, when POS
    /// tags are present, `pos_tags.len() == tokens.len()`.
    pub fn new(
        locus: impl Into<String>,
        tokens: Vec<String>,
        lemmas: Vec<String>,
        pos_tags: Option<Vec<String>>,
    ) -> Result<Self> {
        let locus = locus.into();
        if tokens.len() != lemmas.len() {
            return Err(IntertextError::invalid_unit(format!(
                "unit {}: {} tokens but {} lemmas",
                locus,
                tokens.len(),
                lemmas.len()
            )));
        }
        if let Some(tags) = &pos_tags {
            if tags.len() != tokens.len() {
                return Err(IntertextError::invalid_unit(format!(
                    "unit {}: {} tokens but {} pos tags",
                    locus,
                    tokens.len(),
                    tags.len()
                )));
            }
        }
        Ok(TextUnit {
            locus,
            tokens,
            lemmas,
            pos_tags,
        })
    }

    /// Convenience constructor for units whose lemmas equal their normalized
    /// surface forms.
    pub fn from_tokens(
        locus: impl Into<String>,
        tokens: Vec<String>,
        language: Language,
    ) -> Self {
        let lemmas = tokens.iter().map(|t| language.normalize(t)).collect();
        TextUnit {
            locus: locus.into(),
            tokens,
            lemmas,
            pos_tags: None,
        }
    }

    /// Normalized lemma features and the token positions they occur at.
    ///
    /// Empty lemma placeholders are skipped.
    pub fn lemma_features(&self, language: Language) -> BTreeMap<String, Vec<usize>> {
        let mut features: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (position, lemma) in self.lemmas.iter().enumerate() {
            if lemma.is_empty() {
                continue;
            }
            let normalized = language.normalize(lemma);
            if normalized.is_empty() {
                continue;
            }
            features.entry(normalized).or_default().push(position);
        }
        features
    }

    /// Normalized surface-form features and their token positions.
    pub fn token_features(&self, language: Language) -> BTreeMap<String, Vec<usize>> {
        let mut features: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (position, token) in self.tokens.iter().enumerate() {
            let normalized = language.normalize(token);
            if normalized.is_empty() {
                continue;
            }
            features.entry(normalized).or_default().push(position);
        }
        features
    }

    /// The POS tag at a token position, if tags were provided.
    pub fn pos_tag(&self, position: usize) -> Option<&str> {
        self.pos_tags
            .as_ref()
            .and_then(|tags| tags.get(position))
            .map(|t| t.as_str())
    }

    /// Number of tokens in the unit.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the unit has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Span covered by a set of matched token positions within one unit.
///
/// `1` when fewer than two positions matched, otherwise `max − min`; the
/// result is never less than `1`.
pub fn position_span(positions: &[usize]) -> usize {
    let Some(&min) = positions.iter().min() else {
        return 1;
    };
    let Some(&max) = positions.iter().max() else {
        return 1;
    };
    if positions.len() < 2 {
        return 1;
    }
    (max - min).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(tokens: &[&str], lemmas: &[&str]) -> TextUnit {
        TextUnit::new(
            "1.1",
            tokens.iter().map(|s| s.to_string()).collect(),
            lemmas.iter().map(|s| s.to_string()).collect(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = TextUnit::new(
            "1.1",
            vec!["arma".to_string(), "virumque".to_string()],
            vec!["arma".to_string()],
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_lemma_features_skip_placeholders() {
        let u = unit(&["arma", "virumque", "cano"], &["arma", "", "cano"]);
        let features = u.lemma_features(Language::Latin);
        assert_eq!(features.len(), 2);
        assert_eq!(features["arma"], vec![0]);
        assert_eq!(features["cano"], vec![2]);
    }

    #[test]
    fn test_features_normalized_and_merged() {
        let u = unit(&["Vir", "uir"], &["Vir", "uir"]);
        let features = u.lemma_features(Language::Latin);
        assert_eq!(features.len(), 1);
        assert_eq!(features["uir"], vec![0, 1]);
    }

    #[test]
    fn test_position_span() {
        assert_eq!(position_span(&[]), 1);
        assert_eq!(position_span(&[4]), 1);
        assert_eq!(position_span(&[0, 1]), 1);
        assert_eq!(position_span(&[2, 7, 3]), 5);
        // Duplicate positions never produce a zero span.
        assert_eq!(position_span(&[3, 3]), 1);
    }
}
