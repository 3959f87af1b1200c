//! The search engine facade: typed configuration, cancellation, and the
//! match → score → rank pipeline.

pub mod config;
pub mod search;

pub use config::{FreqBasis, SearchConfig, SearchConfigBuilder};
pub use search::ParallelSearcher;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag for long-running searches.
///
/// Matching is an otherwise unbounded synchronous computation; every
/// matcher loop polls the token and aborts with
/// [`Cancelled`](crate::error::IntertextError::Cancelled) once it is set.
/// Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
