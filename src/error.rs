//! Error types for the Reclaim library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`ReclaimError`] enum. Structural problems (a vector of the wrong
//! length, a corrupt snapshot) surface here; scoring edge cases such as
//! zero vectors or missing locations never do, they are folded into a
//! score of `0.0` by the scorers themselves.
//!
//! # Examples
//!
//! ```
//! use reclaim::error::{ReclaimError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ReclaimError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Reclaim operations.
#[derive(Error, Debug)]
pub enum ReclaimError {
    /// An embedding's length disagrees with the configured dimension.
    #[error("Dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Lookup of an unknown identifier.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An item id that is already indexed, under a rejecting duplicate policy.
    #[error("Duplicate item: {0}")]
    DuplicateItem(String),

    /// Invalid configuration values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid argument passed by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Snapshot decoding or validation errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Failure reported by an external detector or embedder.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization/deserialization errors
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with ReclaimError.
pub type Result<T> = std::result::Result<T, ReclaimError>;

impl ReclaimError {
    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch<S: Into<String>>(context: S, expected: usize, actual: usize) -> Self {
        ReclaimError::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        ReclaimError::NotFound(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        ReclaimError::InvalidConfig(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ReclaimError::InvalidArgument(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        ReclaimError::Storage(msg.into())
    }

    /// Create a new snapshot error.
    pub fn snapshot<S: Into<String>>(msg: S) -> Self {
        ReclaimError::Snapshot(msg.into())
    }

    /// Create a new collaborator error.
    pub fn collaborator<S: Into<String>>(msg: S) -> Self {
        ReclaimError::Collaborator(msg.into())
    }

    /// Whether this error is a dimension mismatch.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, ReclaimError::DimensionMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = ReclaimError::storage("disk full");
        assert_eq!(error.to_string(), "Storage error: disk full");

        let error = ReclaimError::dimension_mismatch("visual embedding", 4, 3);
        assert_eq!(
            error.to_string(),
            "Dimension mismatch for visual embedding: expected 4, got 3"
        );
        assert!(error.is_dimension_mismatch());

        let error = ReclaimError::not_found("internal id 7");
        assert_eq!(error.to_string(), "Not found: internal id 7");
        assert!(!error.is_dimension_mismatch());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let reclaim_error = ReclaimError::from(io_error);

        match reclaim_error {
            ReclaimError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
