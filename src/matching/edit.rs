//! Fuzzy token matching under normalized Levenshtein distance.
//!
//! This basis compares every source token against every target token inside
//! every unit pair, which is quadratic twice over. The matcher therefore
//! computes the exact number of token-pair comparisons up front and refuses
//! oversized requests with a descriptive
//! [`ComparisonLimitExceeded`](crate::error::IntertextError::ComparisonLimitExceeded)
//! instead of silently degrading or blocking.

use std::collections::BTreeMap;

use log::debug;
use rayon::prelude::*;

use crate::error::{IntertextError, Result};
use crate::matching::{
    FeatureHit, MatchBasis, MatchCandidate, MatchContext, MIN_FEATURE_LEN,
};
use crate::unit::TextUnit;

/// Levenshtein edit distance between two strings, by characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Normalized similarity ratio in `[0, 1]`: `1 − distance/max_len`.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Find unit pairs connected by enough fuzzy token pairs.
///
/// A pair of tokens is fuzzy when its similarity ratio reaches
/// `edit_min_ratio`; a unit pair becomes a candidate when at least
/// `min_matches` distinct fuzzy pairs connect it. The candidate's
/// similarity is the mean ratio over its fuzzy pairs.
pub fn find_edit_candidates(
    source: &[TextUnit],
    target: &[TextUnit],
    ctx: &MatchContext,
) -> Result<Vec<MatchCandidate>> {
    let config = ctx.config;

    let source_features: Vec<Vec<(String, Vec<usize>)>> = source
        .iter()
        .map(|unit| matchable_tokens(unit, ctx))
        .collect();
    let target_features: Vec<Vec<(String, Vec<usize>)>> = target
        .iter()
        .map(|unit| matchable_tokens(unit, ctx))
        .collect();

    let source_total: u64 = source_features.iter().map(|f| f.len() as u64).sum();
    let target_total: u64 = target_features.iter().map(|f| f.len() as u64).sum();
    let actual = source_total * target_total;
    if actual > config.max_comparisons {
        return Err(IntertextError::ComparisonLimitExceeded {
            actual,
            max: config.max_comparisons,
        });
    }

    let nested: Vec<Vec<MatchCandidate>> = source_features
        .par_iter()
        .enumerate()
        .map(|(source_idx, source_tokens)| -> Result<Vec<MatchCandidate>> {
            ctx.check_cancelled()?;

            let mut found = Vec::new();
            for (target_idx, target_tokens) in target_features.iter().enumerate() {
                let mut features: BTreeMap<String, FeatureHit> = BTreeMap::new();
                let mut ratio_sum = 0.0;
                let mut pair_count = 0usize;

                for (source_token, source_positions) in source_tokens {
                    for (target_token, target_positions) in target_tokens {
                        let ratio = similarity_ratio(source_token, target_token);
                        if ratio < config.edit_min_ratio {
                            continue;
                        }
                        let key = if source_token == target_token {
                            source_token.clone()
                        } else {
                            format!("{source_token}~{target_token}")
                        };
                        features
                            .entry(key)
                            .or_default()
                            .merge(source_positions, target_positions);
                        ratio_sum += ratio;
                        pair_count += 1;
                    }
                }

                if features.len() < config.min_matches {
                    continue;
                }
                found.push(MatchCandidate {
                    source_idx,
                    target_idx,
                    basis: MatchBasis::EditDistance,
                    features,
                    similarity: Some(ratio_sum / pair_count as f64),
                });
            }
            Ok(found)
        })
        .collect::<Result<Vec<_>>>()?;

    let candidates: Vec<MatchCandidate> = nested.into_iter().flatten().collect();
    debug!(
        "edit-distance matching produced {} candidates over {} token-pair comparisons",
        candidates.len(),
        actual
    );
    Ok(candidates)
}

/// Distinct normalized tokens of a unit worth comparing: non-stoplisted and
/// long enough that a one-edit difference is meaningful.
fn matchable_tokens(unit: &TextUnit, ctx: &MatchContext) -> Vec<(String, Vec<usize>)> {
    unit.token_features(ctx.config.language)
        .into_iter()
        .filter(|(token, _)| {
            token.chars().count() >= MIN_FEATURE_LEN && !ctx.stoplist.contains(token)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Stoplist;
    use crate::engine::CancelToken;
    use crate::engine::config::SearchConfig;
    use crate::language::Language;

    fn unit(locus: &str, words: &[&str]) -> TextUnit {
        TextUnit::from_tokens(
            locus,
            words.iter().map(|s| s.to_string()).collect(),
            Language::Latin,
        )
    }

    fn run(
        source: &[TextUnit],
        target: &[TextUnit],
        config: &SearchConfig,
    ) -> Result<Vec<MatchCandidate>> {
        let stoplist = Stoplist::empty();
        let cancel = CancelToken::new();
        let ctx = MatchContext {
            config,
            stoplist: &stoplist,
            synonyms: None,
            embedder: None,
            cancel: &cancel,
        };
        find_edit_candidates(source, target, &ctx)
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("arma", "arma"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_similarity_ratio() {
        assert_eq!(similarity_ratio("arma", "arma"), 1.0);
        assert!((similarity_ratio("arma", "armis") - 0.6).abs() < 1e-9);
        assert_eq!(similarity_ratio("", ""), 0.0);
    }

    #[test]
    fn test_fuzzy_pairs_required() {
        let source = vec![unit("1.1", &["litora", "multum"])];
        let target = vec![
            unit("2.1", &["litore", "multa"]),
            unit("2.2", &["litore", "xyzzy"]),
        ];
        let mut config = SearchConfig::default();
        config.match_type = MatchBasis::EditDistance;
        config.edit_min_ratio = 0.6;
        let candidates = run(&source, &target, &config).unwrap();
        // Only the first target has two distinct fuzzy pairs.
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].target_idx, 0);
        assert!(candidates[0].features.len() >= 2);
        let similarity = candidates[0].similarity.unwrap();
        assert!(similarity > 0.0 && similarity <= 1.0);
    }

    #[test]
    fn test_comparison_limit() {
        let words: Vec<String> = (0..100).map(|i| format!("uerbum{i:03}")).collect();
        let word_refs: Vec<&str> = words.iter().map(|s| s.as_str()).collect();
        let source: Vec<TextUnit> = (0..30).map(|i| unit(&format!("1.{i}"), &word_refs)).collect();
        let target: Vec<TextUnit> = (0..30).map(|i| unit(&format!("2.{i}"), &word_refs)).collect();
        let mut config = SearchConfig::default();
        config.match_type = MatchBasis::EditDistance;
        // 3000 x 3000 distinct tokens = 9,000,000 comparisons.
        let result = run(&source, &target, &config);
        match result {
            Err(IntertextError::ComparisonLimitExceeded { actual, max }) => {
                assert_eq!(actual, 9_000_000);
                assert_eq!(max, 5_000_000);
            }
            other => panic!("expected ComparisonLimitExceeded, got {other:?}"),
        }
    }
}
