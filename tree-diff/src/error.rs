//! Error types for the tree comparison library

use std::path::PathBuf;

/// Result type alias for tree comparison operations
pub type Result<T> = std::result::Result<T, TreeDiffError>;

/// Errors that escape a comparison run.
///
/// Only a handful of conditions are fatal: everything that goes wrong below
/// the two roots is either recorded in the report or skipped.
#[derive(Debug, thiserror::Error)]
pub enum TreeDiffError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// One of the two root directories could not be opened
    #[error("Failed to open root directory '{path}': {source}")]
    OpenRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid comparison option
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

impl TreeDiffError {
    /// Create a new root-open error
    pub fn open_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OpenRoot {
            path: path.into(),
            source,
        }
    }

    /// Create a new invalid option error
    pub fn option_error(message: impl Into<String>) -> Self {
        Self::InvalidOption(message.into())
    }
}
