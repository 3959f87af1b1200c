//! Shared-vocabulary matching for the lemma, exact, and synonym bases.

use std::collections::BTreeMap;

use ahash::AHashMap;
use log::debug;

use crate::error::Result;
use crate::matching::{
    FeatureHit, MatchBasis, MatchCandidate, MatchContext, MIN_FEATURE_LEN,
};
use crate::unit::TextUnit;

/// Find candidates by intersecting non-stoplisted features.
///
/// Builds a feature → target-unit map once, then walks each source unit's
/// own features through it, grouping hits by target unit and accumulating
/// the matched feature set. A candidate survives only if at least
/// `min_matches` distinct features matched and the span of matched
/// positions in *both* units is within `max_distance`.
pub fn find_vocabulary_candidates(
    source: &[TextUnit],
    target: &[TextUnit],
    ctx: &MatchContext,
) -> Result<Vec<MatchCandidate>> {
    let config = ctx.config;
    let basis = config.match_type;

    // feature -> [(target_idx, positions)]
    let mut target_map: AHashMap<String, Vec<(usize, Vec<usize>)>> = AHashMap::new();
    for (target_idx, unit) in target.iter().enumerate() {
        ctx.check_cancelled()?;
        for (feature, positions) in unit_features(unit, ctx) {
            target_map
                .entry(feature)
                .or_default()
                .push((target_idx, positions));
        }
    }

    let mut candidates = Vec::new();
    for (source_idx, unit) in source.iter().enumerate() {
        ctx.check_cancelled()?;

        // target_idx -> matched feature set
        let mut grouped: BTreeMap<usize, BTreeMap<String, FeatureHit>> = BTreeMap::new();
        for (feature, source_positions) in unit_features(unit, ctx) {
            for key in expansion_keys(&feature, basis, ctx) {
                let Some(hits) = target_map.get(&key) else {
                    continue;
                };
                for (target_idx, target_positions) in hits {
                    grouped
                        .entry(*target_idx)
                        .or_default()
                        .entry(key.clone())
                        .or_default()
                        .merge(&source_positions, target_positions);
                }
            }
        }

        for (target_idx, features) in grouped {
            if features.len() < config.min_matches {
                continue;
            }
            let candidate = MatchCandidate {
                source_idx,
                target_idx,
                basis,
                features,
                similarity: None,
            };
            if candidate.source_span() > config.max_distance
                || candidate.target_span() > config.max_distance
            {
                continue;
            }
            candidates.push(candidate);
        }
    }

    debug!(
        "{} matching produced {} candidates from {}x{} units",
        basis.name(),
        candidates.len(),
        source.len(),
        target.len()
    );
    Ok(candidates)
}

/// A unit's matchable features: normalized, non-stoplisted, and long enough
/// to carry signal.
fn unit_features(unit: &TextUnit, ctx: &MatchContext) -> BTreeMap<String, Vec<usize>> {
    let language = ctx.config.language;
    let features = if ctx.config.match_type == MatchBasis::Exact {
        unit.token_features(language)
    } else {
        unit.lemma_features(language)
    };
    features
        .into_iter()
        .filter(|(feature, _)| {
            feature.chars().count() >= MIN_FEATURE_LEN && !ctx.stoplist.contains(feature)
        })
        .collect()
}

/// Lookup keys for one source feature: the feature itself, plus its synonym
/// expansion when matching on the synonym basis.
fn expansion_keys(feature: &str, basis: MatchBasis, ctx: &MatchContext) -> Vec<String> {
    if basis == MatchBasis::Synonym {
        if let Some(synonyms) = ctx.synonyms {
            return synonyms.expand(feature).map(|s| s.to_string()).collect();
        }
    }
    vec![feature.to_string()]
}
