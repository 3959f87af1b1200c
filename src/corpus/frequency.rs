//! Corpus-wide feature frequency tables.
//!
//! A [`FrequencyTable`] is persisted per language (and per feature kind) as
//! a JSON record carrying a corpus checksum; [`FrequencyCache`] keeps an
//! in-memory hot copy and silently recomputes whenever the checksum no
//! longer matches the corpus on disk. [`LocalFrequencies`] is the
//! request-scoped counterpart counted over just the two texts being
//! searched.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use log::{info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::corpus::checksum::{corpus_checksum, dedup_segmented};
use crate::corpus::provider::CorpusProvider;
use crate::error::Result;
use crate::language::Language;
use crate::unit::TextUnit;

/// Which annotation layer a frequency table counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// Dictionary headwords.
    #[default]
    Lemma,
    /// Normalized surface forms.
    Token,
}

impl FeatureKind {
    fn name(&self) -> &'static str {
        match self {
            FeatureKind::Lemma => "lemma",
            FeatureKind::Token => "token",
        }
    }

    fn unit_features(&self, unit: &TextUnit, language: Language) -> Vec<(String, usize)> {
        let features = match self {
            FeatureKind::Lemma => unit.lemma_features(language),
            FeatureKind::Token => unit.token_features(language),
        };
        features
            .into_iter()
            .map(|(feature, positions)| (feature, positions.len()))
            .collect()
    }
}

/// Read access to feature frequencies, satisfied by both the corpus-wide
/// table and request-local counts.
pub trait FeatureFrequencies {
    /// Occurrence count of a feature. Unknown features report `1`, never
    /// `0`, so downstream log computations stay well-defined.
    fn frequency(&self, feature: &str) -> u64;

    /// Total number of counted tokens.
    fn total_tokens(&self) -> u64;
}

/// Persisted per-language frequency record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyTable {
    /// Corpus language.
    pub language: Language,
    /// Annotation layer the counts cover.
    #[serde(default)]
    pub kind: FeatureKind,
    features: HashMap<String, u64>,
    total_tokens: u64,
    /// Checksum of the corpus file set the table was computed from.
    pub checksum: u32,
    /// When the table was last rebuilt.
    pub updated_at: DateTime<Utc>,
}

impl FrequencyTable {
    /// Count features over a full corpus.
    pub fn build(
        language: Language,
        kind: FeatureKind,
        provider: &dyn CorpusProvider,
    ) -> Result<Self> {
        let manifest = dedup_segmented(provider.manifest(language)?);
        let checksum = corpus_checksum(&manifest);

        let mut features: HashMap<String, u64> = HashMap::new();
        let mut total_tokens = 0u64;
        for file in &manifest {
            for unit in provider.read_units(language, &file.filename)? {
                for (feature, count) in kind.unit_features(&unit, language) {
                    *features.entry(feature).or_insert(0) += count as u64;
                    total_tokens += count as u64;
                }
            }
        }

        info!(
            "frequency table rebuilt: {} {} features for {}, {} tokens",
            features.len(),
            kind.name(),
            language,
            total_tokens
        );

        Ok(FrequencyTable {
            language,
            kind,
            features,
            total_tokens,
            checksum,
            updated_at: Utc::now(),
        })
    }

    /// The raw feature→count map.
    pub fn features(&self) -> &HashMap<String, u64> {
        &self.features
    }

    /// Number of distinct features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the table counted nothing.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FeatureFrequencies for FrequencyTable {
    fn frequency(&self, feature: &str) -> u64 {
        self.features.get(feature).copied().unwrap_or(1).max(1)
    }

    fn total_tokens(&self) -> u64 {
        self.total_tokens
    }
}

/// Request-local frequencies counted over the units being searched.
#[derive(Debug, Clone, Default)]
pub struct LocalFrequencies {
    counts: AHashMap<String, u64>,
    total_tokens: u64,
}

impl LocalFrequencies {
    /// Count features over the source and target unit lists.
    pub fn build(
        kind: FeatureKind,
        language: Language,
        source: &[TextUnit],
        target: &[TextUnit],
    ) -> Self {
        let mut counts: AHashMap<String, u64> = AHashMap::new();
        let mut total_tokens = 0u64;
        for unit in source.iter().chain(target.iter()) {
            for (feature, count) in kind.unit_features(unit, language) {
                *counts.entry(feature).or_insert(0) += count as u64;
                total_tokens += count as u64;
            }
        }
        LocalFrequencies {
            counts,
            total_tokens,
        }
    }
}

impl FeatureFrequencies for LocalFrequencies {
    fn frequency(&self, feature: &str) -> u64 {
        self.counts.get(feature).copied().unwrap_or(1).max(1)
    }

    fn total_tokens(&self) -> u64 {
        self.total_tokens
    }
}

/// Per-language frequency tables with a persisted copy and an in-memory hot
/// cache.
///
/// Every read compares the stored checksum against the current corpus
/// manifest; on mismatch the table is silently recomputed and re-persisted.
/// A reader racing a rebuild sees either the old or the new `Arc` snapshot,
/// never a torn table.
pub struct FrequencyCache {
    cache_dir: PathBuf,
    tables: RwLock<AHashMap<(Language, FeatureKind), Arc<FrequencyTable>>>,
}

impl FrequencyCache {
    /// Create a cache persisting under `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        FrequencyCache {
            cache_dir: cache_dir.into(),
            tables: RwLock::new(AHashMap::new()),
        }
    }

    fn table_path(&self, language: Language, kind: FeatureKind) -> PathBuf {
        self.cache_dir
            .join(format!("frequency_{}_{}.json", language.name(), kind.name()))
    }

    /// Get the table for a language, rebuilding if stale or missing.
    pub fn get(
        &self,
        language: Language,
        kind: FeatureKind,
        provider: &dyn CorpusProvider,
    ) -> Result<Arc<FrequencyTable>> {
        let manifest = dedup_segmented(provider.manifest(language)?);
        let current = corpus_checksum(&manifest);

        if let Some(table) = self.tables.read().get(&(language, kind)) {
            if table.checksum == current {
                return Ok(table.clone());
            }
        }

        let path = self.table_path(language, kind);
        if let Some(table) = load_json::<FrequencyTable>(&path) {
            if table.checksum == current && table.kind == kind {
                let table = Arc::new(table);
                self.tables
                    .write()
                    .insert((language, kind), table.clone());
                return Ok(table);
            }
        }

        self.rebuild(language, kind, provider)
    }

    /// Force a full recompute and re-persist.
    pub fn rebuild(
        &self,
        language: Language,
        kind: FeatureKind,
        provider: &dyn CorpusProvider,
    ) -> Result<Arc<FrequencyTable>> {
        let table = Arc::new(FrequencyTable::build(language, kind, provider)?);
        store_json(&self.table_path(language, kind), table.as_ref())?;
        self.tables.write().insert((language, kind), table.clone());
        Ok(table)
    }
}

/// Read a persisted JSON record, treating any failure as a cache miss.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.is_file() {
        return None;
    }
    match fs::File::open(path) {
        Ok(file) => match serde_json::from_reader(file) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("ignoring malformed cache file {}: {e}", path.display());
                None
            }
        },
        Err(e) => {
            warn!("cannot open cache file {}: {e}", path.display());
            None
        }
    }
}

/// Persist a JSON record through a temp-file-then-rename commit.
pub(crate) fn store_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let file = fs::File::create(&tmp)?;
    serde_json::to_writer(file, value)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
