//! Persistent per-language inverted index.

pub mod inverted;

pub use inverted::{CoOccurrence, IndexHandle, LemmaHits, PostingLocation, TextEntry};
