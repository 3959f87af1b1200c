//! Error types for the intertext engine.

use thiserror::Error;

/// Errors that can occur during matching, scoring, and index operations.
#[derive(Error, Debug)]
pub enum IntertextError {
    /// An invalid argument was passed to an engine call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The search configuration is inconsistent or out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An annotated text unit violates its structural invariants.
    #[error("Invalid text unit: {0}")]
    InvalidUnit(String),

    /// An inverted index operation failed.
    #[error("Index error: {0}")]
    Index(String),

    /// A corpus provider operation failed.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// The requested comparison would exceed the safety ceiling for
    /// combinatorial match modes.
    ///
    /// The caller must re-scope the request (e.g. a smaller text subset);
    /// no retry is implied.
    #[error("Comparison limit exceeded: {actual} token-pair comparisons requested, maximum is {max}")]
    ComparisonLimitExceeded {
        /// Number of token-pair comparisons the request would perform.
        actual: u64,
        /// Configured ceiling.
        max: u64,
    },

    /// The search was cancelled through its [`CancelToken`](crate::engine::CancelToken).
    #[error("Search cancelled")]
    Cancelled,

    /// An I/O error from the storage layer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl IntertextError {
    /// Create an invalid argument error.
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        IntertextError::InvalidArgument(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        IntertextError::InvalidConfig(message.into())
    }

    /// Create an invalid unit error.
    pub fn invalid_unit<S: Into<String>>(message: S) -> Self {
        IntertextError::InvalidUnit(message.into())
    }

    /// Create an index error.
    pub fn index<S: Into<String>>(message: S) -> Self {
        IntertextError::Index(message.into())
    }

    /// Create a corpus error.
    pub fn corpus<S: Into<String>>(message: S) -> Self {
        IntertextError::Corpus(message.into())
    }
}

/// Result type alias using [`IntertextError`].
pub type Result<T> = std::result::Result<T, IntertextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IntertextError::invalid_argument("bad basis");
        assert_eq!(err.to_string(), "Invalid argument: bad basis");

        let err = IntertextError::ComparisonLimitExceeded {
            actual: 6_000_000,
            max: 5_000_000,
        };
        assert!(err.to_string().contains("6000000"));
        assert!(err.to_string().contains("5000000"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: IntertextError = io.into();
        assert!(matches!(err, IntertextError::Io(_)));
    }
}
