//! Multi-signal composite correlation.
//!
//! The correlator merges up to four independently scored match sets for the
//! same text pair — lemma, semantic, sound, and edit distance — into one
//! confidence-tiered verdict per unit pair. It performs no matching itself:
//! it is a pure merge-and-classify step and accepts any subset of the four
//! inputs.

use std::cmp::Ordering;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::matching::MatchBasis;
use crate::scoring::ScoredResult;

/// Confidence bucket determined solely by how many independent signals
/// corroborate a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceTier {
    /// All four signals present.
    Gold,
    /// Three signals.
    Silver,
    /// Two signals.
    Bronze,
    /// One signal.
    Copper,
}

impl ConfidenceTier {
    /// Tier for a signal count; `None` for zero signals (excluded from
    /// output).
    pub fn from_signal_count(count: usize) -> Option<Self> {
        match count {
            4 => Some(ConfidenceTier::Gold),
            3 => Some(ConfidenceTier::Silver),
            2 => Some(ConfidenceTier::Bronze),
            1 => Some(ConfidenceTier::Copper),
            _ => None,
        }
    }
}

/// Externally tunable per-signal inclusion thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeThresholds {
    /// Minimum lemma raw score.
    pub lemma_min_score: f64,
    /// Minimum number of matched lemmas.
    pub lemma_min_matches: usize,
    /// Minimum semantic cosine similarity.
    pub semantic_min_similarity: f64,
    /// Minimum sound trigram similarity.
    pub sound_min_similarity: f64,
    /// Minimum edit-distance similarity.
    pub edit_distance_min_similarity: f64,
}

impl Default for CompositeThresholds {
    fn default() -> Self {
        CompositeThresholds {
            lemma_min_score: 7.0,
            lemma_min_matches: 2,
            semantic_min_similarity: 0.7,
            sound_min_similarity: 0.6,
            edit_distance_min_similarity: 0.5,
        }
    }
}

/// One signal's verdict for a unit pair, extracted from a scored match set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMatch {
    /// Locus of the source unit.
    pub source_ref: String,
    /// Locus of the target unit.
    pub target_ref: String,
    /// The signal's own score: ln-scale for lemma, similarity for the rest.
    pub score: f64,
    /// Number of matched vocabulary features (lemma signal only).
    pub matched_count: usize,
}

impl SignalMatch {
    /// Extract a signal record from a scored result.
    ///
    /// The lemma signal carries the un-normalized `raw_score` (the scale its
    /// calibrated threshold is defined on); similarity bases carry their
    /// similarity.
    pub fn from_scored(result: &ScoredResult, basis: MatchBasis) -> Self {
        let score = if basis.is_vocabulary() {
            result.raw_score
        } else {
            result.overall_score
        };
        SignalMatch {
            source_ref: result.source_ref.clone(),
            target_ref: result.target_ref.clone(),
            score,
            matched_count: result.matched_count(),
        }
    }
}

/// The four optional scored inputs, one per signal type.
#[derive(Debug, Clone, Default)]
pub struct SignalSet {
    /// Lemma-basis matches.
    pub lemma: Option<Vec<SignalMatch>>,
    /// Semantic-basis matches.
    pub semantic: Option<Vec<SignalMatch>>,
    /// Sound-basis matches.
    pub sound: Option<Vec<SignalMatch>>,
    /// Edit-distance-basis matches.
    pub edit_distance: Option<Vec<SignalMatch>>,
}

/// One correlated unit pair with its per-signal scores and derived verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeMatch {
    /// Locus of the source unit.
    pub source_ref: String,
    /// Locus of the target unit.
    pub target_ref: String,
    /// Lemma raw score, when that signal met its threshold.
    pub lemma_score: Option<f64>,
    /// Semantic similarity, when present.
    pub semantic_score: Option<f64>,
    /// Sound similarity, when present.
    pub sound_score: Option<f64>,
    /// Edit-distance similarity, when present.
    pub edit_distance_score: Option<f64>,
    /// Confidence bucket from the count of present signals.
    pub confidence_tier: ConfidenceTier,
    /// Sum of the present signals, each normalized into `[0, 1]` (lemma via
    /// `min(score/10, 1)`).
    pub composite_score: f64,
}

impl CompositeMatch {
    fn signal_count(&self) -> usize {
        [
            self.lemma_score.is_some(),
            self.semantic_score.is_some(),
            self.sound_score.is_some(),
            self.edit_distance_score.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

/// Merges independently scored match sets into tiered verdicts.
#[derive(Debug, Clone, Default)]
pub struct CompositeCorrelator {
    thresholds: CompositeThresholds,
}

impl CompositeCorrelator {
    /// Create a correlator with the default calibrated thresholds.
    pub fn new() -> Self {
        CompositeCorrelator::default()
    }

    /// Create a correlator with custom thresholds.
    pub fn with_thresholds(thresholds: CompositeThresholds) -> Self {
        CompositeCorrelator { thresholds }
    }

    /// Correlate any subset of the four signal inputs.
    ///
    /// Pairs where a signal falls below its threshold simply record that
    /// signal as absent; pairs with zero present signals are dropped. The
    /// output is ordered tier-major, composite score descending within each
    /// tier.
    pub fn correlate(&self, signals: &SignalSet) -> Vec<CompositeMatch> {
        let t = &self.thresholds;

        // (source_ref, target_ref) -> accumulating record
        let mut grouped: AHashMap<(String, String), CompositeMatch> = AHashMap::new();

        if let Some(lemma) = &signals.lemma {
            for m in lemma {
                if m.score >= t.lemma_min_score && m.matched_count >= t.lemma_min_matches {
                    let record = upsert(&mut grouped, m);
                    record.lemma_score = Some(record.lemma_score.map_or(m.score, |s| s.max(m.score)));
                }
            }
        }
        if let Some(semantic) = &signals.semantic {
            for m in semantic {
                if m.score >= t.semantic_min_similarity {
                    let record = upsert(&mut grouped, m);
                    record.semantic_score =
                        Some(record.semantic_score.map_or(m.score, |s| s.max(m.score)));
                }
            }
        }
        if let Some(sound) = &signals.sound {
            for m in sound {
                if m.score >= t.sound_min_similarity {
                    let record = upsert(&mut grouped, m);
                    record.sound_score = Some(record.sound_score.map_or(m.score, |s| s.max(m.score)));
                }
            }
        }
        if let Some(edit) = &signals.edit_distance {
            for m in edit {
                if m.score >= t.edit_distance_min_similarity {
                    let record = upsert(&mut grouped, m);
                    record.edit_distance_score =
                        Some(record.edit_distance_score.map_or(m.score, |s| s.max(m.score)));
                }
            }
        }

        let mut matches: Vec<CompositeMatch> = grouped
            .into_values()
            .filter_map(|mut record| {
                let tier = ConfidenceTier::from_signal_count(record.signal_count())?;
                record.confidence_tier = tier;
                record.composite_score = composite_score(&record);
                Some(record)
            })
            .collect();

        matches.sort_by(|a, b| {
            a.confidence_tier
                .cmp(&b.confidence_tier)
                .then_with(|| {
                    b.composite_score
                        .partial_cmp(&a.composite_score)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.source_ref.cmp(&b.source_ref))
                .then_with(|| a.target_ref.cmp(&b.target_ref))
        });
        matches
    }
}

fn upsert<'m>(
    grouped: &'m mut AHashMap<(String, String), CompositeMatch>,
    m: &SignalMatch,
) -> &'m mut CompositeMatch {
    grouped
        .entry((m.source_ref.clone(), m.target_ref.clone()))
        .or_insert_with(|| CompositeMatch {
            source_ref: m.source_ref.clone(),
            target_ref: m.target_ref.clone(),
            lemma_score: None,
            semantic_score: None,
            sound_score: None,
            edit_distance_score: None,
            confidence_tier: ConfidenceTier::Copper,
            composite_score: 0.0,
        })
}

/// Sum of present signals normalized into `[0, 1]`.
fn composite_score(record: &CompositeMatch) -> f64 {
    let mut score = 0.0;
    if let Some(lemma) = record.lemma_score {
        score += (lemma / 10.0).min(1.0);
    }
    for signal in [
        record.semantic_score,
        record.sound_score,
        record.edit_distance_score,
    ]
    .into_iter()
    .flatten()
    {
        score += signal.clamp(0.0, 1.0);
    }
    score
}
