//! Candidate scoring.
//!
//! Vocabulary candidates (lemma/exact/synonym) are scored with an
//! information-theoretic formula: the summed inverse corpus frequency of the
//! matched features, damped by the distance the match spreads over in each
//! unit, normalized against the best achievable score, and clipped to
//! `[0, 1]`. Auxiliary agreement signals multiply the score and the bigram
//! rarity bonus is added on top. Sound, edit-distance, and semantic
//! candidates carry their own similarity metric directly.

pub mod bigram;
pub mod features;
pub mod result;

pub use features::{BoostBreakdown, ExternalScorer, FeatureScorer};
pub use result::ScoredResult;

use std::collections::BTreeMap;

use log::warn;

use crate::corpus::bigram::BigramFrequencyTable;
use crate::corpus::frequency::FeatureFrequencies;
use crate::engine::config::SearchConfig;
use crate::matching::MatchCandidate;
use crate::unit::TextUnit;

/// Inverse document frequency weight of a feature.
///
/// `ln((total+1)/(freq+1)) + 1`, so even a feature as frequent as the whole
/// corpus contributes a positive weight and a zero-token corpus stays
/// finite.
pub fn idf(frequency: u64, total_tokens: u64) -> f64 {
    ((total_tokens + 1) as f64 / (frequency + 1) as f64).ln() + 1.0
}

/// Scores match candidates into [`ScoredResult`] records.
pub struct Scorer<'a> {
    config: &'a SearchConfig,
    frequencies: &'a dyn FeatureFrequencies,
    bigrams: Option<&'a BigramFrequencyTable>,
    feature_scorer: FeatureScorer<'a>,
}

impl<'a> Scorer<'a> {
    /// Create a scorer over the chosen frequency basis.
    pub fn new(
        config: &'a SearchConfig,
        frequencies: &'a dyn FeatureFrequencies,
        bigrams: Option<&'a BigramFrequencyTable>,
        feature_scorer: FeatureScorer<'a>,
    ) -> Self {
        Scorer {
            config,
            frequencies,
            bigrams,
            feature_scorer,
        }
    }

    /// Score one candidate.
    ///
    /// Returns `None` when the candidate refers outside its units; a corrupt
    /// pair is a local failure and must not abort the surrounding search.
    pub fn score(
        &self,
        candidate: &MatchCandidate,
        source_unit: &TextUnit,
        target_unit: &TextUnit,
    ) -> Option<ScoredResult> {
        let source_highlights = candidate.source_positions();
        let target_highlights = candidate.target_positions();
        if source_highlights.iter().any(|p| *p >= source_unit.len())
            || target_highlights.iter().any(|p| *p >= target_unit.len())
        {
            warn!(
                "skipping corrupt candidate {} -> {}: matched position out of range",
                source_unit.locus, target_unit.locus
            );
            return None;
        }

        let source_distance = candidate.source_span();
        let target_distance = candidate.target_span();

        let mut matched_words: BTreeMap<String, f64> = BTreeMap::new();
        let mut feature_breakdown: BTreeMap<String, f64> = BTreeMap::new();

        let (raw_score, base_score, overall_score) = if candidate.basis.is_vocabulary() {
            for feature in candidate.features.keys() {
                matched_words.insert(
                    feature.clone(),
                    idf(self.frequencies.frequency(feature), self.frequencies.total_tokens()),
                );
            }
            let total_freq_score: f64 = matched_words.values().sum();

            let distance_penalty = (source_distance + target_distance) as f64 / 2.0;
            let distance_factor = if distance_penalty > 0.0 {
                1.0 / (distance_penalty + 1.0).ln()
            } else {
                1.0
            };
            let raw = total_freq_score * distance_factor;

            let total_tokens = self.frequencies.total_tokens();
            let max_score = if total_tokens == 0 {
                1.0
            } else {
                candidate.features.len() as f64 * ((total_tokens + 1) as f64).ln()
            };
            let base = (raw / max_score).min(1.0);

            let boost = self.feature_scorer.boost(candidate, source_unit, target_unit);
            feature_breakdown.extend(boost.signals.clone());
            let mut overall = (base * boost.boost).min(1.0);

            if self.config.bigram_boost {
                if let Some(table) = self.bigrams {
                    let (bonus, pairs) = bigram::bigram_rarity_bonus(
                        candidate,
                        table,
                        self.config.bigram_window,
                        self.config.bigram_weight,
                    );
                    feature_breakdown.extend(pairs);
                    // Added, not multiplied, then clipped back into range.
                    overall = (overall + bonus).min(1.0);
                }
            }

            (raw, base, overall)
        } else {
            // Similarity bases carry their own metric.
            let similarity = candidate.similarity.unwrap_or(0.0).clamp(0.0, 1.0);
            feature_breakdown.insert(candidate.basis.name().to_string(), similarity);
            (similarity, similarity, similarity)
        };

        Some(ScoredResult {
            source_ref: source_unit.locus.clone(),
            target_ref: target_unit.locus.clone(),
            source_tokens: source_unit.tokens.clone(),
            target_tokens: target_unit.tokens.clone(),
            source_highlights,
            target_highlights,
            matched_words,
            source_distance,
            target_distance,
            raw_score,
            base_score,
            overall_score,
            features: feature_breakdown,
        })
    }
}
