//! Corpus-wide bigram frequency tables.
//!
//! Bigrams are unordered feature pairs observed within a small positional
//! window inside one unit. The canonical key joins the two members in
//! lexicographic order, so direction never matters. Rarity is derived from
//! document frequency: a pair attested in few texts scores close to `1.0`.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use log::info;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::corpus::checksum::{corpus_checksum, dedup_segmented};
use crate::corpus::frequency::{load_json, store_json};
use crate::corpus::provider::CorpusProvider;
use crate::error::Result;
use crate::language::Language;
use crate::unit::TextUnit;

/// Maximum positional distance between two features counted as a corpus
/// bigram (one intervening word).
const CORPUS_BIGRAM_WINDOW: usize = 2;

/// Canonical key for an unordered feature pair.
pub fn canonical_bigram_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a} {b}")
    } else {
        format!("{b} {a}")
    }
}

/// Persisted per-language bigram frequency record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BigramFrequencyTable {
    /// Corpus language.
    pub language: Language,
    counts: HashMap<String, u64>,
    doc_counts: HashMap<String, u64>,
    total_docs: u64,
    /// Checksum of the corpus file set the table was computed from.
    pub checksum: u32,
    /// When the table was last rebuilt.
    pub updated_at: DateTime<Utc>,
}

impl BigramFrequencyTable {
    /// Count bigrams over a full corpus.
    ///
    /// Each deduplicated corpus text is one document for document-frequency
    /// purposes.
    pub fn build(language: Language, provider: &dyn CorpusProvider) -> Result<Self> {
        let manifest = dedup_segmented(provider.manifest(language)?);
        let checksum = corpus_checksum(&manifest);

        let mut counts: HashMap<String, u64> = HashMap::new();
        let mut doc_counts: HashMap<String, u64> = HashMap::new();
        let mut total_docs = 0u64;

        for file in &manifest {
            let units = provider.read_units(language, &file.filename)?;
            total_docs += 1;
            let mut seen_in_doc: HashSet<String> = HashSet::new();
            for unit in &units {
                for key in unit_bigrams(unit, language) {
                    *counts.entry(key.clone()).or_insert(0) += 1;
                    if seen_in_doc.insert(key.clone()) {
                        *doc_counts.entry(key).or_insert(0) += 1;
                    }
                }
            }
        }

        info!(
            "bigram table rebuilt: {} pairs over {} {} texts",
            counts.len(),
            total_docs,
            language
        );

        Ok(BigramFrequencyTable {
            language,
            counts,
            doc_counts,
            total_docs,
            checksum,
            updated_at: Utc::now(),
        })
    }

    /// Total occurrence count of a pair.
    pub fn count(&self, a: &str, b: &str) -> u64 {
        self.counts
            .get(&canonical_bigram_key(a, b))
            .copied()
            .unwrap_or(0)
    }

    /// Number of corpus texts attesting a pair.
    pub fn document_frequency(&self, a: &str, b: &str) -> u64 {
        self.doc_counts
            .get(&canonical_bigram_key(a, b))
            .copied()
            .unwrap_or(0)
    }

    /// Number of texts the table was counted over.
    pub fn total_docs(&self) -> u64 {
        self.total_docs
    }

    /// Rarity score in `[0, 1]`: `1 − doc_freq/total_docs`.
    ///
    /// An unknown pair, or an empty corpus, is maximally rare.
    pub fn rarity(&self, a: &str, b: &str) -> f64 {
        if self.total_docs == 0 {
            return 1.0;
        }
        let doc_freq = self.document_frequency(a, b);
        (1.0 - doc_freq as f64 / self.total_docs as f64).clamp(0.0, 1.0)
    }

    /// Bigram IDF score: `ln((total_docs+1)/(doc_freq+1))`.
    pub fn idf(&self, a: &str, b: &str) -> f64 {
        let doc_freq = self.document_frequency(a, b);
        ((self.total_docs + 1) as f64 / (doc_freq + 1) as f64).ln()
    }

    /// Number of distinct pairs counted.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the table counted nothing.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Distinct canonical bigram keys within one unit's window.
fn unit_bigrams(unit: &TextUnit, language: Language) -> HashSet<String> {
    let mut ordered: Vec<(usize, String)> = Vec::new();
    for (position, lemma) in unit.lemmas.iter().enumerate() {
        if lemma.is_empty() {
            continue;
        }
        let normalized = language.normalize(lemma);
        if normalized.is_empty() {
            continue;
        }
        ordered.push((position, normalized));
    }

    let mut keys = HashSet::new();
    for (i, (pos_a, feature_a)) in ordered.iter().enumerate() {
        for (pos_b, feature_b) in ordered.iter().skip(i + 1) {
            if pos_b - pos_a > CORPUS_BIGRAM_WINDOW {
                break;
            }
            if feature_a == feature_b {
                continue;
            }
            keys.insert(canonical_bigram_key(feature_a, feature_b));
        }
    }
    keys
}

/// Per-language bigram tables with a persisted copy and an in-memory hot
/// cache, mirroring [`FrequencyCache`](crate::corpus::FrequencyCache).
pub struct BigramFrequencyCache {
    cache_dir: PathBuf,
    tables: RwLock<AHashMap<Language, Arc<BigramFrequencyTable>>>,
}

impl BigramFrequencyCache {
    /// Create a cache persisting under `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        BigramFrequencyCache {
            cache_dir: cache_dir.into(),
            tables: RwLock::new(AHashMap::new()),
        }
    }

    fn table_path(&self, language: Language) -> PathBuf {
        self.cache_dir
            .join(format!("bigram_{}.json", language.name()))
    }

    /// Get the table for a language, rebuilding if stale or missing.
    pub fn get(
        &self,
        language: Language,
        provider: &dyn CorpusProvider,
    ) -> Result<Arc<BigramFrequencyTable>> {
        let manifest = dedup_segmented(provider.manifest(language)?);
        let current = corpus_checksum(&manifest);

        if let Some(table) = self.tables.read().get(&language) {
            if table.checksum == current {
                return Ok(table.clone());
            }
        }

        let path = self.table_path(language);
        if let Some(table) = load_json::<BigramFrequencyTable>(&path) {
            if table.checksum == current {
                let table = Arc::new(table);
                self.tables.write().insert(language, table.clone());
                return Ok(table);
            }
        }

        self.rebuild(language, provider)
    }

    /// Force a full recompute and re-persist.
    pub fn rebuild(
        &self,
        language: Language,
        provider: &dyn CorpusProvider,
    ) -> Result<Arc<BigramFrequencyTable>> {
        let table = Arc::new(BigramFrequencyTable::build(language, provider)?);
        store_json(&self.table_path(language), table.as_ref())?;
        self.tables.write().insert(language, table.clone());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(doc_counts: &[(&str, u64)], total_docs: u64) -> BigramFrequencyTable {
        BigramFrequencyTable {
            language: Language::Latin,
            counts: HashMap::new(),
            doc_counts: doc_counts
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            total_docs,
            checksum: 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_canonical_key_direction_irrelevant() {
        assert_eq!(
            canonical_bigram_key("uir", "arma"),
            canonical_bigram_key("arma", "uir")
        );
        assert_eq!(canonical_bigram_key("arma", "uir"), "arma uir");
    }

    #[test]
    fn test_rarity_examples() {
        let table = table_with(&[("arma uir", 50), ("cano troia", 25)], 50);
        // doc_freq 0 of 50.
        assert_eq!(table.rarity("fama", "uolo"), 1.0);
        // doc_freq 50 of 50.
        assert_eq!(table.rarity("arma", "uir"), 0.0);
        // doc_freq 25 of 50.
        assert_eq!(table.rarity("cano", "troia"), 0.5);
    }

    #[test]
    fn test_empty_corpus_is_maximally_rare() {
        let table = table_with(&[], 0);
        assert_eq!(table.rarity("a", "b"), 1.0);
        // IDF stays finite: ln(1/1) = 0.
        assert_eq!(table.idf("a", "b"), 0.0);
    }

    #[test]
    fn test_unit_bigrams_window() {
        let unit = TextUnit::from_tokens(
            "1.1",
            vec![
                "arma".to_string(),
                "uirum".to_string(),
                "cano".to_string(),
                "troiae".to_string(),
            ],
            Language::Latin,
        );
        let keys = unit_bigrams(&unit, Language::Latin);
        // Adjacent and one-apart pairs are counted.
        assert!(keys.contains(&canonical_bigram_key("arma", "uirum")));
        assert!(keys.contains(&canonical_bigram_key("arma", "cano")));
        // Three positions apart is outside the window.
        assert!(!keys.contains(&canonical_bigram_key("arma", "troiae")));
    }
}
