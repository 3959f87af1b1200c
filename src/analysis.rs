//! Request-scoped text analysis: stoplist construction, character trigrams,
//! and synonym expansion.

pub mod stoplist;
pub mod synonym;
pub mod trigram;

pub use stoplist::{Stoplist, StoplistBasis, StoplistBuilder};
pub use synonym::SynonymMap;
pub use trigram::unit_trigrams;
