//! The constructed-once owner of all per-language corpus state.

use std::path::PathBuf;
use std::sync::Arc;

use ahash::AHashMap;
use log::info;
use parking_lot::RwLock;

use crate::corpus::bigram::{BigramFrequencyCache, BigramFrequencyTable};
use crate::corpus::checksum::dedup_segmented;
use crate::corpus::frequency::{FeatureKind, FrequencyCache, FrequencyTable};
use crate::corpus::provider::{author_title_from_filename, CorpusProvider};
use crate::error::Result;
use crate::index::inverted::{index_dir, IndexHandle};
use crate::language::Language;

/// Owns the per-language frequency tables, bigram tables, and inverted
/// index handles for one corpus.
///
/// Constructed once and passed by reference into matching and scoring
/// calls; there is no hidden module-global state. The caches inside are
/// read-mostly: searches share `Arc` snapshots while rebuilds (assumed
/// operator-triggered and rare) swap the snapshot atomically.
pub struct CorpusIndexService {
    provider: Arc<dyn CorpusProvider>,
    data_dir: PathBuf,
    frequency: FrequencyCache,
    bigrams: BigramFrequencyCache,
    indexes: RwLock<AHashMap<Language, Arc<RwLock<IndexHandle>>>>,
}

impl std::fmt::Debug for CorpusIndexService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusIndexService")
            .field("data_dir", &self.data_dir)
            .field("open_indexes", &self.indexes.read().len())
            .finish()
    }
}

impl CorpusIndexService {
    /// Create a service persisting its caches and indexes under `data_dir`.
    pub fn new(provider: Arc<dyn CorpusProvider>, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let cache_dir = data_dir.join("cache");
        CorpusIndexService {
            provider,
            data_dir,
            frequency: FrequencyCache::new(&cache_dir),
            bigrams: BigramFrequencyCache::new(&cache_dir),
            indexes: RwLock::new(AHashMap::new()),
        }
    }

    /// The corpus provider backing this service.
    pub fn provider(&self) -> &dyn CorpusProvider {
        self.provider.as_ref()
    }

    /// Corpus frequency table for a language, rebuilt when stale.
    pub fn frequencies(
        &self,
        language: Language,
        kind: FeatureKind,
    ) -> Result<Arc<FrequencyTable>> {
        self.frequency.get(language, kind, self.provider.as_ref())
    }

    /// Corpus bigram table for a language, rebuilt when stale.
    pub fn bigram_frequencies(&self, language: Language) -> Result<Arc<BigramFrequencyTable>> {
        self.bigrams.get(language, self.provider.as_ref())
    }

    /// Force a rebuild of every table for a language.
    pub fn rebuild_caches(&self, language: Language) -> Result<()> {
        self.frequency
            .rebuild(language, FeatureKind::Lemma, self.provider.as_ref())?;
        self.frequency
            .rebuild(language, FeatureKind::Token, self.provider.as_ref())?;
        self.bigrams.rebuild(language, self.provider.as_ref())?;
        Ok(())
    }

    /// The inverted index handle for a language, opened on first use and
    /// cached for the service's lifetime.
    pub fn index(&self, language: Language) -> Result<Arc<RwLock<IndexHandle>>> {
        if let Some(handle) = self.indexes.read().get(&language) {
            return Ok(handle.clone());
        }
        let mut indexes = self.indexes.write();
        // Re-check: another thread may have opened it while we upgraded.
        if let Some(handle) = indexes.get(&language) {
            return Ok(handle.clone());
        }
        let handle = Arc::new(RwLock::new(IndexHandle::open(
            index_dir(&self.data_dir, language),
            language,
        )?));
        indexes.insert(language, handle.clone());
        Ok(handle)
    }

    /// Index every not-yet-indexed corpus text for a language.
    ///
    /// Returns the number of newly indexed texts. Already-indexed files are
    /// skipped, so this is safe to run after adding single texts.
    pub fn index_corpus(&self, language: Language) -> Result<usize> {
        let manifest = dedup_segmented(self.provider.manifest(language)?);
        let handle = self.index(language)?;
        let mut index = handle.write();

        let mut added = 0usize;
        for file in &manifest {
            if index.contains_text(&file.filename) {
                continue;
            }
            let units = self.provider.read_units(language, &file.filename)?;
            let (author, title) = author_title_from_filename(&file.filename);
            index.add_text(&file.filename, &author, &title, &units)?;
            added += 1;
        }
        index.commit()?;

        if added > 0 {
            info!("indexed {added} new {language} texts");
        }
        Ok(added)
    }

    /// Index a single corpus text incrementally.
    pub fn index_text(&self, language: Language, filename: &str) -> Result<u32> {
        let units = self.provider.read_units(language, filename)?;
        let (author, title) = author_title_from_filename(filename);
        let handle = self.index(language)?;
        let mut index = handle.write();
        let text_id = index.add_text(filename, &author, &title, &units)?;
        index.commit()?;
        Ok(text_id)
    }

    /// Commit and release the index handle for a language.
    pub fn close_index(&self, language: Language) -> Result<()> {
        if let Some(handle) = self.indexes.write().remove(&language) {
            handle.write().commit()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::provider::DirectoryCorpus;
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    fn write_corpus(dir: &Path, filename: &str, content: &str) {
        let lang_dir = dir.join("latin");
        fs::create_dir_all(&lang_dir).unwrap();
        let mut file = fs::File::create(lang_dir.join(filename)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn service(corpus_root: &Path, data_dir: &Path) -> CorpusIndexService {
        CorpusIndexService::new(Arc::new(DirectoryCorpus::new(corpus_root)), data_dir)
    }

    #[test]
    fn test_index_corpus_incremental() {
        let corpus_dir = tempfile::tempdir().unwrap();
        let data_dir = tempfile::tempdir().unwrap();
        write_corpus(
            corpus_dir.path(),
            "vergilius.aeneid.txt",
            "1.1\tarma uirum cano",
        );

        let service = service(corpus_dir.path(), data_dir.path());
        assert_eq!(service.index_corpus(Language::Latin).unwrap(), 1);
        // A second run indexes nothing new.
        assert_eq!(service.index_corpus(Language::Latin).unwrap(), 0);

        write_corpus(corpus_dir.path(), "ovidius.amores.txt", "1.1\tarma graui");
        assert_eq!(service.index_corpus(Language::Latin).unwrap(), 1);

        let handle = service.index(Language::Latin).unwrap();
        let index = handle.read();
        assert_eq!(index.texts().len(), 2);
        assert_eq!(index.lookup("arma").locations.len(), 2);
        let entry = index.text(0).unwrap();
        assert_eq!(entry.author, "vergilius");
        assert_eq!(entry.title, "aeneid");
    }

    #[test]
    fn test_close_and_reopen_index() {
        let corpus_dir = tempfile::tempdir().unwrap();
        let data_dir = tempfile::tempdir().unwrap();
        write_corpus(corpus_dir.path(), "a.b.txt", "1.1\tarma");

        let service = service(corpus_dir.path(), data_dir.path());
        service.index_corpus(Language::Latin).unwrap();
        service.close_index(Language::Latin).unwrap();

        // Reopening reads the committed store.
        let handle = service.index(Language::Latin).unwrap();
        assert_eq!(handle.read().texts().len(), 1);
    }

    #[test]
    fn test_frequencies_via_service() {
        let corpus_dir = tempfile::tempdir().unwrap();
        let data_dir = tempfile::tempdir().unwrap();
        write_corpus(corpus_dir.path(), "a.b.txt", "1.1\tarma arma uirum");

        let service = service(corpus_dir.path(), data_dir.path());
        let table = service
            .frequencies(Language::Latin, FeatureKind::Lemma)
            .unwrap();
        use crate::corpus::frequency::FeatureFrequencies;
        assert_eq!(table.frequency("arma"), 2);

        let bigrams = service.bigram_frequencies(Language::Latin).unwrap();
        assert_eq!(bigrams.total_docs(), 1);
        assert_eq!(bigrams.document_frequency("arma", "uirum"), 1);
    }
}
