//! Corpus service integration: persisted caches and the inverted index.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use intertext::{
    CorpusIndexService, DirectoryCorpus, FeatureFrequencies, FeatureKind, Language,
};

fn write_corpus(root: &Path, filename: &str, content: &str) {
    let lang_dir = root.join("latin");
    fs::create_dir_all(&lang_dir).unwrap();
    fs::write(lang_dir.join(filename), content).unwrap();
}

fn sample_corpus(root: &Path) {
    write_corpus(
        root,
        "vergilius.aeneid.txt",
        "1.1\tarma:arma virumque:vir cano:cano\n1.2\ttroiae:troia qui:qui primus:primus",
    );
    write_corpus(
        root,
        "lucanus.pharsalia.txt",
        "1.1\tbella:bellum arma:arma virum:vir",
    );
}

#[test]
fn test_index_persists_across_service_instances() {
    let corpus_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    sample_corpus(corpus_dir.path());

    {
        let service = CorpusIndexService::new(
            Arc::new(DirectoryCorpus::new(corpus_dir.path())),
            data_dir.path(),
        );
        assert_eq!(service.index_corpus(Language::Latin).unwrap(), 2);
    }

    // A fresh service over the same data directory reads the committed
    // store and indexes nothing new.
    let service = CorpusIndexService::new(
        Arc::new(DirectoryCorpus::new(corpus_dir.path())),
        data_dir.path(),
    );
    assert_eq!(service.index_corpus(Language::Latin).unwrap(), 0);

    let handle = service.index(Language::Latin).unwrap();
    let index = handle.read();
    assert_eq!(index.texts().len(), 2);

    // Lemma annotations were normalized at indexing time; the v-spelling
    // query folds to the same canonical lemma.
    let hits = index.lookup("vir");
    assert_eq!(hits.lemma, "uir");
    assert_eq!(hits.locations.len(), 2);
}

#[test]
fn test_co_occurrence_query_through_service() {
    let corpus_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    sample_corpus(corpus_dir.path());

    let service = CorpusIndexService::new(
        Arc::new(DirectoryCorpus::new(corpus_dir.path())),
        data_dir.path(),
    );
    service.index_corpus(Language::Latin).unwrap();

    let handle = service.index(Language::Latin).unwrap();
    let index = handle.read();

    let results = index.co_occurrences(&["arma", "uir"], 2, None).unwrap();
    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(result.matched.len() >= 2);
        assert!(result.span >= 1);
    }

    // Requiring a third lemma present only in the aeneid narrows the hits.
    let results = index
        .co_occurrences(&["arma", "uir", "cano"], 3, None)
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].unit_ref, "1.1");
}

#[test]
fn test_segmented_texts_not_double_counted() {
    let corpus_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    // Whole text plus two "part" segmentations of the same work.
    write_corpus(corpus_dir.path(), "vergilius.aeneid.txt", "1.1\tarma uirum");
    write_corpus(
        corpus_dir.path(),
        "vergilius.aeneid.part.1.txt",
        "1.1\tarma uirum",
    );
    write_corpus(
        corpus_dir.path(),
        "vergilius.aeneid.part.2.txt",
        "1.2\tarma cano",
    );

    let service = CorpusIndexService::new(
        Arc::new(DirectoryCorpus::new(corpus_dir.path())),
        data_dir.path(),
    );
    let table = service
        .frequencies(Language::Latin, FeatureKind::Lemma)
        .unwrap();
    // Only the whole text is counted.
    assert_eq!(table.frequency("arma"), 1);
    assert_eq!(table.total_tokens(), 2);

    let bigrams = service.bigram_frequencies(Language::Latin).unwrap();
    assert_eq!(bigrams.total_docs(), 1);
}

#[test]
fn test_cache_staleness_after_corpus_growth() {
    let corpus_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    write_corpus(corpus_dir.path(), "a.b.txt", "1.1\tarma uirum");

    let service = CorpusIndexService::new(
        Arc::new(DirectoryCorpus::new(corpus_dir.path())),
        data_dir.path(),
    );
    let before = service
        .frequencies(Language::Latin, FeatureKind::Lemma)
        .unwrap();
    assert_eq!(before.frequency("cano"), 1); // unknown defaults to 1

    write_corpus(corpus_dir.path(), "c.d.txt", "1.1\tcano cano cano");
    let after = service
        .frequencies(Language::Latin, FeatureKind::Lemma)
        .unwrap();
    assert_eq!(after.frequency("cano"), 3);
    assert_ne!(before.checksum, after.checksum);
}
