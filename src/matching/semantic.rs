//! Semantic matching through a pluggable embedding provider.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::debug;

use crate::embedding::cosine_similarity;
use crate::error::{IntertextError, Result};
use crate::matching::{MatchBasis, MatchCandidate, MatchContext};
use crate::unit::TextUnit;

/// Rank target units by embedding cosine similarity per source unit.
///
/// Units the provider cannot embed are skipped; missing embeddings are a
/// local condition, not a search failure. Requires an embedder on the
/// context.
pub fn find_semantic_candidates(
    source: &[TextUnit],
    target: &[TextUnit],
    ctx: &MatchContext,
) -> Result<Vec<MatchCandidate>> {
    let config = ctx.config;
    let Some(embedder) = ctx.embedder else {
        return Err(IntertextError::invalid_argument(
            "semantic matching requires an embedding provider",
        ));
    };

    let target_vectors: Vec<Option<Vec<f32>>> =
        target.iter().map(|unit| embedder.embed(unit)).collect();
    let embedded_targets = target_vectors.iter().filter(|v| v.is_some()).count();
    if embedded_targets < target.len() {
        debug!(
            "semantic matching: {} of {} target units have no embedding",
            target.len() - embedded_targets,
            target.len()
        );
    }

    let mut candidates = Vec::new();
    for (source_idx, unit) in source.iter().enumerate() {
        ctx.check_cancelled()?;
        let Some(source_vector) = embedder.embed(unit) else {
            continue;
        };

        let mut ranked: Vec<(usize, f64)> = target_vectors
            .iter()
            .enumerate()
            .filter_map(|(target_idx, vector)| {
                let vector = vector.as_ref()?;
                let similarity = cosine_similarity(&source_vector, vector);
                (similarity >= config.semantic_floor).then_some((target_idx, similarity))
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(config.semantic_top_n);

        candidates.extend(ranked.into_iter().map(|(target_idx, similarity)| {
            MatchCandidate {
                source_idx,
                target_idx,
                basis: MatchBasis::Semantic,
                // Semantic correspondence has no shared-vocabulary features.
                features: BTreeMap::new(),
                similarity: Some(similarity.clamp(0.0, 1.0)),
            }
        }));
    }

    debug!(
        "semantic matching produced {} candidates from {}x{} units",
        candidates.len(),
        source.len(),
        target.len()
    );
    Ok(candidates)
}
