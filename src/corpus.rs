//! Corpus-wide frequency infrastructure.
//!
//! Everything here is built once per corpus and read by many search
//! requests: the [`CorpusProvider`] contract for enumerating and reading
//! annotated texts, checksummed staleness detection, the persisted
//! unigram/bigram frequency tables with their in-memory hot caches, and the
//! [`CorpusIndexService`] that owns all of it.

pub mod bigram;
pub mod checksum;
pub mod frequency;
pub mod provider;
pub mod service;

pub use bigram::{BigramFrequencyCache, BigramFrequencyTable, canonical_bigram_key};
pub use checksum::{corpus_checksum, dedup_segmented};
pub use frequency::{
    FeatureFrequencies, FeatureKind, FrequencyCache, FrequencyTable, LocalFrequencies,
};
pub use provider::{CorpusFileMeta, CorpusProvider, DirectoryCorpus};
pub use service::CorpusIndexService;
