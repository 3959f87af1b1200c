//! Auxiliary agreement signals that boost the base score.
//!
//! Each signal is gated by its own feature flag and contributes only when it
//! clears its own minimum threshold; the final boost is `1 + Σ weight ·
//! signal`. Metrical and syntactic scores come from outside the engine
//! through the [`ExternalScorer`] contract.

use std::collections::BTreeMap;

use crate::analysis::trigram::{jaccard, unit_trigrams};
use crate::engine::config::SearchConfig;
use crate::matching::edit::similarity_ratio;
use crate::matching::MatchCandidate;
use crate::unit::TextUnit;

/// A pluggable external signal provider (metrical scansion, dependency
/// syntax, …).
///
/// Returning `None` means the provider has no opinion on the pair; the
/// signal is simply absent.
pub trait ExternalScorer: Send + Sync {
    /// Name used in result breakdowns.
    fn name(&self) -> &str;

    /// Agreement score for a unit pair, expected in `[0, 1]`.
    fn score(&self, source: &TextUnit, target: &TextUnit) -> Option<f64>;
}

/// The multiplicative boost and the raw signal values that produced it.
#[derive(Debug, Clone, Default)]
pub struct BoostBreakdown {
    /// Multiplicative factor applied to the base score, `>= 1`.
    pub boost: f64,
    /// Raw signal values keyed by signal name.
    pub signals: BTreeMap<String, f64>,
}

/// Computes auxiliary-signal boosts for vocabulary candidates.
pub struct FeatureScorer<'a> {
    config: &'a SearchConfig,
    meter: Option<&'a dyn ExternalScorer>,
    syntax: Option<&'a dyn ExternalScorer>,
}

impl<'a> FeatureScorer<'a> {
    /// Create a feature scorer with optional external providers.
    pub fn new(
        config: &'a SearchConfig,
        meter: Option<&'a dyn ExternalScorer>,
        syntax: Option<&'a dyn ExternalScorer>,
    ) -> Self {
        FeatureScorer {
            config,
            meter,
            syntax,
        }
    }

    /// Accumulate the enabled signals for one candidate.
    pub fn boost(
        &self,
        candidate: &MatchCandidate,
        source_unit: &TextUnit,
        target_unit: &TextUnit,
    ) -> BoostBreakdown {
        let config = self.config;
        let mut breakdown = BoostBreakdown {
            boost: 1.0,
            signals: BTreeMap::new(),
        };

        if config.use_pos {
            if let Some(agreement) = pos_agreement(candidate, source_unit, target_unit) {
                breakdown.signals.insert("pos".to_string(), agreement);
                if agreement >= config.pos_min_agreement {
                    breakdown.boost += config.pos_weight * agreement;
                }
            }
        }

        if config.use_edit_distance {
            if let Some(similarity) =
                matched_token_similarity(candidate, source_unit, target_unit)
            {
                breakdown
                    .signals
                    .insert("edit_distance".to_string(), similarity);
                if similarity >= config.edit_min_similarity {
                    breakdown.boost += config.edit_weight * similarity;
                }
            }
        }

        if config.use_sound {
            let source_set = unit_trigrams(source_unit, config.language);
            let target_set = unit_trigrams(target_unit, config.language);
            let similarity = jaccard(&source_set, &target_set);
            breakdown.signals.insert("sound".to_string(), similarity);
            if similarity >= config.sound_min_similarity {
                breakdown.boost += config.sound_weight * similarity;
            }
        }

        if config.use_meter {
            if let Some(provider) = self.meter {
                if let Some(score) = provider.score(source_unit, target_unit) {
                    let score = score.clamp(0.0, 1.0);
                    breakdown.signals.insert(provider.name().to_string(), score);
                    if score >= config.external_min_score {
                        breakdown.boost += config.meter_weight * score;
                    }
                }
            }
        }

        if config.use_syntax {
            if let Some(provider) = self.syntax {
                if let Some(score) = provider.score(source_unit, target_unit) {
                    let score = score.clamp(0.0, 1.0);
                    breakdown.signals.insert(provider.name().to_string(), score);
                    if score >= config.external_min_score {
                        breakdown.boost += config.syntax_weight * score;
                    }
                }
            }
        }

        breakdown
    }
}

/// Fraction of matched features whose tokens carry the same POS tag in both
/// units. `None` when no matched feature has tags on both sides.
fn pos_agreement(
    candidate: &MatchCandidate,
    source_unit: &TextUnit,
    target_unit: &TextUnit,
) -> Option<f64> {
    let mut compared = 0usize;
    let mut agreed = 0usize;
    for hit in candidate.features.values() {
        let source_tag = hit
            .source_positions
            .first()
            .and_then(|p| source_unit.pos_tag(*p));
        let target_tag = hit
            .target_positions
            .first()
            .and_then(|p| target_unit.pos_tag(*p));
        if let (Some(source_tag), Some(target_tag)) = (source_tag, target_tag) {
            compared += 1;
            if source_tag == target_tag {
                agreed += 1;
            }
        }
    }
    (compared > 0).then(|| agreed as f64 / compared as f64)
}

/// Mean surface-form similarity over the matched features.
fn matched_token_similarity(
    candidate: &MatchCandidate,
    source_unit: &TextUnit,
    target_unit: &TextUnit,
) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0usize;
    for hit in candidate.features.values() {
        let source_token = hit
            .source_positions
            .first()
            .and_then(|p| source_unit.tokens.get(*p));
        let target_token = hit
            .target_positions
            .first()
            .and_then(|p| target_unit.tokens.get(*p));
        if let (Some(source_token), Some(target_token)) = (source_token, target_token) {
            total += similarity_ratio(
                &source_token.to_lowercase(),
                &target_token.to_lowercase(),
            );
            count += 1;
        }
    }
    (count > 0).then(|| total / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{FeatureHit, MatchBasis};

    fn tagged_unit(locus: &str, words: &[&str], tags: &[&str]) -> TextUnit {
        TextUnit::new(
            locus,
            words.iter().map(|s| s.to_string()).collect(),
            words.iter().map(|s| s.to_lowercase()).collect(),
            Some(tags.iter().map(|s| s.to_string()).collect()),
        )
        .unwrap()
    }

    fn candidate() -> MatchCandidate {
        let mut features = std::collections::BTreeMap::new();
        features.insert(
            "arma".to_string(),
            FeatureHit {
                source_positions: vec![0],
                target_positions: vec![0],
            },
        );
        features.insert(
            "cano".to_string(),
            FeatureHit {
                source_positions: vec![1],
                target_positions: vec![1],
            },
        );
        MatchCandidate {
            source_idx: 0,
            target_idx: 0,
            basis: MatchBasis::Lemma,
            features,
            similarity: None,
        }
    }

    #[test]
    fn test_all_signals_off_means_unit_boost() {
        let config = SearchConfig::default();
        let scorer = FeatureScorer::new(&config, None, None);
        let source = tagged_unit("1.1", &["arma", "cano"], &["NOUN", "VERB"]);
        let target = tagged_unit("2.1", &["armis", "canit"], &["NOUN", "VERB"]);
        let breakdown = scorer.boost(&candidate(), &source, &target);
        assert_eq!(breakdown.boost, 1.0);
        assert!(breakdown.signals.is_empty());
    }

    #[test]
    fn test_pos_agreement_boost() {
        let mut config = SearchConfig::default();
        config.use_pos = true;
        let scorer = FeatureScorer::new(&config, None, None);
        let source = tagged_unit("1.1", &["arma", "cano"], &["NOUN", "VERB"]);
        let target = tagged_unit("2.1", &["arma", "cano"], &["NOUN", "VERB"]);
        let breakdown = scorer.boost(&candidate(), &source, &target);
        assert_eq!(breakdown.signals["pos"], 1.0);
        assert!((breakdown.boost - (1.0 + config.pos_weight)).abs() < 1e-9);
    }

    #[test]
    fn test_below_threshold_signal_recorded_but_not_boosting() {
        let mut config = SearchConfig::default();
        config.use_pos = true;
        let scorer = FeatureScorer::new(&config, None, None);
        // Tags disagree on both features: agreement 0.0 < minimum.
        let source = tagged_unit("1.1", &["arma", "cano"], &["NOUN", "VERB"]);
        let target = tagged_unit("2.1", &["arma", "cano"], &["ADJ", "NOUN"]);
        let breakdown = scorer.boost(&candidate(), &source, &target);
        assert_eq!(breakdown.signals["pos"], 0.0);
        assert_eq!(breakdown.boost, 1.0);
    }

    #[test]
    fn test_external_scorer() {
        struct FixedMeter;
        impl ExternalScorer for FixedMeter {
            fn name(&self) -> &str {
                "meter"
            }
            fn score(&self, _source: &TextUnit, _target: &TextUnit) -> Option<f64> {
                Some(0.9)
            }
        }

        let mut config = SearchConfig::default();
        config.use_meter = true;
        let meter = FixedMeter;
        let scorer = FeatureScorer::new(&config, Some(&meter), None);
        let source = tagged_unit("1.1", &["arma", "cano"], &["NOUN", "VERB"]);
        let target = tagged_unit("2.1", &["arma", "cano"], &["NOUN", "VERB"]);
        let breakdown = scorer.boost(&candidate(), &source, &target);
        assert_eq!(breakdown.signals["meter"], 0.9);
        assert!((breakdown.boost - (1.0 + config.meter_weight * 0.9)).abs() < 1e-9);
    }

    #[test]
    fn test_edit_distance_signal() {
        let mut config = SearchConfig::default();
        config.use_edit_distance = true;
        let scorer = FeatureScorer::new(&config, None, None);
        let source = tagged_unit("1.1", &["arma", "cano"], &["NOUN", "VERB"]);
        let target = tagged_unit("2.1", &["arma", "cano"], &["NOUN", "VERB"]);
        let breakdown = scorer.boost(&candidate(), &source, &target);
        // Identical surfaces: similarity 1.0, boost by the full weight.
        assert_eq!(breakdown.signals["edit_distance"], 1.0);
        assert!((breakdown.boost - (1.0 + config.edit_weight)).abs() < 1e-9);
    }
}
