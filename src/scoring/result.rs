//! The terminal scored-match record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One scored parallel between a source and a target unit.
///
/// Terminal: returned to the caller in ranked order and never mutated
/// afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    /// Locus of the source unit.
    pub source_ref: String,
    /// Locus of the target unit.
    pub target_ref: String,
    /// Surface tokens of the source unit.
    pub source_tokens: Vec<String>,
    /// Surface tokens of the target unit.
    pub target_tokens: Vec<String>,
    /// Matched token positions in the source unit.
    pub source_highlights: Vec<usize>,
    /// Matched token positions in the target unit.
    pub target_highlights: Vec<usize>,
    /// Per-feature IDF contributions (vocabulary bases only).
    pub matched_words: BTreeMap<String, f64>,
    /// Span of matched positions in the source unit.
    pub source_distance: usize,
    /// Span of matched positions in the target unit.
    pub target_distance: usize,
    /// Un-normalized ln-scale score. This is the value the composite layer
    /// thresholds and normalizes; for similarity bases it equals the raw
    /// similarity.
    pub raw_score: f64,
    /// Normalized score before auxiliary boosts, in `[0, 1]`.
    pub base_score: f64,
    /// Final score after boosts, in `[0, 1]`.
    pub overall_score: f64,
    /// Auxiliary signal breakdown keyed by signal name.
    pub features: BTreeMap<String, f64>,
}

impl ScoredResult {
    /// Number of matched vocabulary features.
    pub fn matched_count(&self) -> usize {
        self.matched_words.len()
    }
}
