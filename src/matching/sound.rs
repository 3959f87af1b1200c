//! Sound matching over character trigram sets.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use log::debug;
use rayon::prelude::*;

use crate::analysis::trigram::{jaccard, token_trigrams, unit_trigrams};
use crate::error::Result;
use crate::matching::{FeatureHit, MatchBasis, MatchCandidate, MatchContext};
use crate::unit::TextUnit;

/// Rank target units by trigram Jaccard similarity per source unit.
///
/// Unlike the vocabulary matchers this is bounded, not exhaustive: only
/// targets at or above `sound_floor` survive, and each source unit keeps at
/// most `sound_top_n` of them.
pub fn find_sound_candidates(
    source: &[TextUnit],
    target: &[TextUnit],
    ctx: &MatchContext,
) -> Result<Vec<MatchCandidate>> {
    let config = ctx.config;
    let language = config.language;

    let target_sets: Vec<HashSet<String>> = target
        .par_iter()
        .map(|unit| unit_trigrams(unit, language))
        .collect();
    let target_token_sets: Vec<Vec<HashSet<String>>> = target
        .par_iter()
        .map(|unit| per_token_trigrams(unit, ctx))
        .collect();

    let nested: Vec<Vec<MatchCandidate>> = source
        .par_iter()
        .enumerate()
        .map(|(source_idx, unit)| -> Result<Vec<MatchCandidate>> {
            ctx.check_cancelled()?;

            let own_set = unit_trigrams(unit, language);
            let own_token_sets = per_token_trigrams(unit, ctx);

            let mut ranked: Vec<(usize, f64)> = target_sets
                .iter()
                .enumerate()
                .map(|(target_idx, set)| (target_idx, jaccard(&own_set, set)))
                .filter(|(_, similarity)| *similarity >= config.sound_floor)
                .collect();
            ranked.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });
            ranked.truncate(config.sound_top_n);

            Ok(ranked
                .into_iter()
                .filter_map(|(target_idx, similarity)| {
                    let features = shared_trigram_features(
                        &own_set,
                        &target_sets[target_idx],
                        &own_token_sets,
                        &target_token_sets[target_idx],
                    );
                    if features.len() < config.min_matches {
                        return None;
                    }
                    Some(MatchCandidate {
                        source_idx,
                        target_idx,
                        basis: MatchBasis::Sound,
                        features,
                        similarity: Some(similarity),
                    })
                })
                .collect())
        })
        .collect::<Result<Vec<_>>>()?;

    let mut candidates: Vec<MatchCandidate> = nested.into_iter().flatten().collect();
    candidates.sort_by(|a, b| {
        a.source_idx
            .cmp(&b.source_idx)
            .then_with(|| a.target_idx.cmp(&b.target_idx))
    });

    debug!(
        "sound matching produced {} candidates from {}x{} units",
        candidates.len(),
        source.len(),
        target.len()
    );
    Ok(candidates)
}

fn per_token_trigrams(unit: &TextUnit, ctx: &MatchContext) -> Vec<HashSet<String>> {
    unit.tokens
        .iter()
        .map(|token| token_trigrams(token, ctx.config.language))
        .collect()
}

/// Shared trigrams keyed for the candidate, with the positions of every
/// token containing each trigram so highlights cover the sounding words.
fn shared_trigram_features(
    source_set: &HashSet<String>,
    target_set: &HashSet<String>,
    source_tokens: &[HashSet<String>],
    target_tokens: &[HashSet<String>],
) -> BTreeMap<String, FeatureHit> {
    let mut features = BTreeMap::new();
    for trigram in source_set.intersection(target_set) {
        let source_positions: Vec<usize> = source_tokens
            .iter()
            .enumerate()
            .filter(|(_, set)| set.contains(trigram))
            .map(|(position, _)| position)
            .collect();
        let target_positions: Vec<usize> = target_tokens
            .iter()
            .enumerate()
            .filter(|(_, set)| set.contains(trigram))
            .map(|(position, _)| position)
            .collect();
        features.insert(
            trigram.clone(),
            FeatureHit {
                source_positions,
                target_positions,
            },
        );
    }
    features
}
