//! Pluggable semantic signal providers.
//!
//! Embedding computation lives outside this crate; the engine only consumes
//! per-unit vectors through the [`UnitEmbedder`] contract and compares them
//! by cosine similarity.

use ahash::AHashMap;

use crate::unit::TextUnit;

/// Supplies an embedding vector for a text unit.
///
/// Returning `None` means the provider cannot embed the unit; the semantic
/// matcher skips such units rather than failing the search.
pub trait UnitEmbedder: Send + Sync {
    /// Embed one unit.
    fn embed(&self, unit: &TextUnit) -> Option<Vec<f32>>;
}

/// An embedder backed by a precomputed locus → vector map.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedEmbedder {
    vectors: AHashMap<String, Vec<f32>>,
}

impl PrecomputedEmbedder {
    /// Create an empty embedder.
    pub fn new() -> Self {
        PrecomputedEmbedder::default()
    }

    /// Register the vector for a locus.
    pub fn insert(&mut self, locus: impl Into<String>, vector: Vec<f32>) {
        self.vectors.insert(locus.into(), vector);
    }

    /// Number of registered vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether no vectors are registered.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl FromIterator<(String, Vec<f32>)> for PrecomputedEmbedder {
    fn from_iter<I: IntoIterator<Item = (String, Vec<f32>)>>(iter: I) -> Self {
        PrecomputedEmbedder {
            vectors: iter.into_iter().collect(),
        }
    }
}

impl UnitEmbedder for PrecomputedEmbedder {
    fn embed(&self, unit: &TextUnit) -> Option<Vec<f32>> {
        self.vectors.get(&unit.locus).cloned()
    }
}

/// Cosine similarity of two vectors.
///
/// Mismatched dimensions or a zero-magnitude vector yield `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += *x as f64 * *y as f64;
        norm_a += *x as f64 * *x as f64;
        norm_b += *y as f64 * *y as f64;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
