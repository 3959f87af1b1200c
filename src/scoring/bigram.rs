//! Bigram rarity bonus.

use std::collections::BTreeMap;

use crate::corpus::bigram::{canonical_bigram_key, BigramFrequencyTable};
use crate::matching::MatchCandidate;

/// Minimum corpus rarity before a shared pair contributes.
const RARITY_FLOOR: f64 = 0.8;

/// Additive bonus for shared rare word pairs.
///
/// A pair of matched features counts when its occurrences fall within the
/// intervening-word `window` in *both* units (adjacency is `window == 0`)
/// and its corpus rarity is at least the floor. Each qualifying pair adds
/// `rarity × weight`; the per-pair rarities are reported for the result's
/// feature breakdown.
pub fn bigram_rarity_bonus(
    candidate: &MatchCandidate,
    table: &BigramFrequencyTable,
    window: usize,
    weight: f64,
) -> (f64, BTreeMap<String, f64>) {
    let max_distance = window + 1;
    let features: Vec<(&String, &crate::matching::FeatureHit)> =
        candidate.features.iter().collect();

    let mut bonus = 0.0;
    let mut pairs = BTreeMap::new();
    for (i, (feature_a, hit_a)) in features.iter().enumerate() {
        for (feature_b, hit_b) in features.iter().skip(i + 1) {
            if !within_window(&hit_a.source_positions, &hit_b.source_positions, max_distance)
                || !within_window(&hit_a.target_positions, &hit_b.target_positions, max_distance)
            {
                continue;
            }
            let rarity = table.rarity(feature_a, feature_b);
            if rarity < RARITY_FLOOR {
                continue;
            }
            bonus += rarity * weight;
            pairs.insert(
                format!("bigram:{}", canonical_bigram_key(feature_a, feature_b)),
                rarity,
            );
        }
    }
    (bonus, pairs)
}

/// Whether any pair of positions from the two lists lies within
/// `max_distance`.
fn within_window(a: &[usize], b: &[usize], max_distance: usize) -> bool {
    a.iter()
        .any(|pa| b.iter().any(|pb| pa.abs_diff(*pb) <= max_distance))
}
