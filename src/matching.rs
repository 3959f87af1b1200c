//! Candidate generation between source and target units.
//!
//! Each match strategy is one variant of the closed [`MatchBasis`] enum;
//! [`find_candidates`] dispatches through a fixed table rather than a
//! runtime registry. Every matcher produces the same [`MatchCandidate`]
//! shape for uniform downstream scoring.

pub mod edit;
pub mod lemma;
pub mod semantic;
pub mod sound;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{Stoplist, SynonymMap};
use crate::embedding::UnitEmbedder;
use crate::engine::config::SearchConfig;
use crate::engine::CancelToken;
use crate::error::{IntertextError, Result};
use crate::unit::{position_span, TextUnit};

/// Minimum normalized feature length considered by the vocabulary matchers.
pub(crate) const MIN_FEATURE_LEN: usize = 2;

/// The closed set of match strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchBasis {
    /// Shared dictionary headwords.
    #[default]
    Lemma,
    /// Shared normalized surface forms.
    Exact,
    /// Character-trigram sound similarity.
    Sound,
    /// Fuzzy token pairs under normalized Levenshtein distance.
    EditDistance,
    /// Embedding cosine similarity.
    Semantic,
    /// Shared headwords after synonym expansion.
    Synonym,
}

impl MatchBasis {
    /// Short name used in persisted settings and result breakdowns.
    pub fn name(&self) -> &'static str {
        match self {
            MatchBasis::Lemma => "lemma",
            MatchBasis::Exact => "exact",
            MatchBasis::Sound => "sound",
            MatchBasis::EditDistance => "edit_distance",
            MatchBasis::Semantic => "semantic",
            MatchBasis::Synonym => "synonym",
        }
    }

    /// Whether this basis matches shared vocabulary features (as opposed to
    /// a whole-unit similarity metric).
    pub fn is_vocabulary(&self) -> bool {
        matches!(
            self,
            MatchBasis::Lemma | MatchBasis::Exact | MatchBasis::Synonym
        )
    }
}

/// Positions of one shared feature within the two matched units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureHit {
    /// Token positions in the source unit.
    pub source_positions: Vec<usize>,
    /// Token positions in the target unit.
    pub target_positions: Vec<usize>,
}

impl FeatureHit {
    fn merge(&mut self, source: &[usize], target: &[usize]) {
        for p in source {
            if !self.source_positions.contains(p) {
                self.source_positions.push(*p);
            }
        }
        for p in target {
            if !self.target_positions.contains(p) {
                self.target_positions.push(*p);
            }
        }
        self.source_positions.sort_unstable();
        self.target_positions.sort_unstable();
    }
}

/// One candidate correspondence between a source and a target unit.
///
/// Ephemeral: produced by the matchers, consumed by the scorer, never
/// persisted.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    /// Index of the source unit.
    pub source_idx: usize,
    /// Index of the target unit.
    pub target_idx: usize,
    /// Strategy that produced the candidate.
    pub basis: MatchBasis,
    /// Shared features and where they occur. Keyed deterministically.
    pub features: BTreeMap<String, FeatureHit>,
    /// Direct similarity for sound/edit-distance/semantic candidates.
    pub similarity: Option<f64>,
}

impl MatchCandidate {
    /// All matched token positions in the source unit, sorted and distinct.
    pub fn source_positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .features
            .values()
            .flat_map(|hit| hit.source_positions.iter().copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    /// All matched token positions in the target unit, sorted and distinct.
    pub fn target_positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .features
            .values()
            .flat_map(|hit| hit.target_positions.iter().copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    /// Span of matched positions in the source unit.
    pub fn source_span(&self) -> usize {
        position_span(&self.source_positions())
    }

    /// Span of matched positions in the target unit.
    pub fn target_span(&self) -> usize {
        position_span(&self.target_positions())
    }
}

/// Everything a matcher needs besides the unit lists.
pub struct MatchContext<'a> {
    /// The validated search configuration.
    pub config: &'a SearchConfig,
    /// Features excluded from matching.
    pub stoplist: &'a Stoplist,
    /// Synonym table for [`MatchBasis::Synonym`].
    pub synonyms: Option<&'a SynonymMap>,
    /// Embedding provider for [`MatchBasis::Semantic`].
    pub embedder: Option<&'a dyn UnitEmbedder>,
    /// Cooperative cancellation flag, checked inside every matcher loop.
    pub cancel: &'a CancelToken,
}

impl<'a> MatchContext<'a> {
    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(IntertextError::Cancelled);
        }
        Ok(())
    }
}

/// Generate match candidates between two unit sequences.
///
/// Dispatches on the configured [`MatchBasis`]; the returned candidates all
/// satisfy the `min_matches` and span constraints of their strategy.
pub fn find_candidates(
    source: &[TextUnit],
    target: &[TextUnit],
    ctx: &MatchContext,
) -> Result<Vec<MatchCandidate>> {
    match ctx.config.match_type {
        MatchBasis::Lemma | MatchBasis::Exact | MatchBasis::Synonym => {
            lemma::find_vocabulary_candidates(source, target, ctx)
        }
        MatchBasis::Sound => sound::find_sound_candidates(source, target, ctx),
        MatchBasis::EditDistance => edit::find_edit_candidates(source, target, ctx),
        MatchBasis::Semantic => semantic::find_semantic_candidates(source, target, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_names() {
        assert_eq!(MatchBasis::Lemma.name(), "lemma");
        assert_eq!(MatchBasis::EditDistance.name(), "edit_distance");
        assert!(MatchBasis::Synonym.is_vocabulary());
        assert!(!MatchBasis::Sound.is_vocabulary());
    }

    #[test]
    fn test_candidate_spans() {
        let mut features = BTreeMap::new();
        features.insert(
            "arma".to_string(),
            FeatureHit {
                source_positions: vec![0],
                target_positions: vec![2],
            },
        );
        features.insert(
            "uir".to_string(),
            FeatureHit {
                source_positions: vec![4],
                target_positions: vec![3],
            },
        );
        let candidate = MatchCandidate {
            source_idx: 0,
            target_idx: 0,
            basis: MatchBasis::Lemma,
            features,
            similarity: None,
        };
        assert_eq!(candidate.source_span(), 4);
        assert_eq!(candidate.target_span(), 1);
    }
}
