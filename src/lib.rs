//! # Intertext
//!
//! An intertextual parallel matching and scoring engine for annotated
//! classical texts.
//!
//! ## Features
//!
//! - Candidate matching on lemma, exact-form, synonym, sound,
//!   edit-distance, and semantic bases
//! - Automatic stoplist construction with Zipf elbow detection
//! - Corpus-frequency-driven IDF scoring with distance damping and
//!   auxiliary signal boosts
//! - Multi-signal composite correlation into confidence tiers
//! - Persistent per-language frequency tables and inverted indexes

// Core modules
pub mod analysis;
pub mod composite;
pub mod corpus;
pub mod embedding;
pub mod engine;
mod error;
pub mod index;
pub mod language;
pub mod matching;
pub mod scoring;
pub mod unit;

// Re-exports for the public API
pub use analysis::{Stoplist, StoplistBasis, StoplistBuilder, SynonymMap};
pub use composite::{
    CompositeCorrelator, CompositeMatch, CompositeThresholds, ConfidenceTier, SignalMatch,
    SignalSet,
};
pub use corpus::{
    BigramFrequencyCache, BigramFrequencyTable, CorpusIndexService, CorpusProvider,
    DirectoryCorpus, FeatureFrequencies, FeatureKind, FrequencyCache, FrequencyTable,
};
pub use embedding::{PrecomputedEmbedder, UnitEmbedder};
pub use engine::{CancelToken, FreqBasis, ParallelSearcher, SearchConfig, SearchConfigBuilder};
pub use error::{IntertextError, Result};
pub use index::{CoOccurrence, IndexHandle, LemmaHits, TextEntry};
pub use language::Language;
pub use matching::{MatchBasis, MatchCandidate};
pub use scoring::{ExternalScorer, ScoredResult};
pub use unit::TextUnit;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
