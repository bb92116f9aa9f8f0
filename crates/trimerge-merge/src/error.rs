//! Error types for the merge crate.

use std::path::PathBuf;

use trimerge_types::TypeError;

/// Errors that abort a merge or a configuration load.
///
/// Semantic divergence between the versions is never an error: it is
/// reported as a [`Conflict`](crate::Conflict) alongside a complete merged
/// document.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The configuration cannot drive a merge (e.g. no default operation).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A configured path could not be parsed.
    #[error("invalid path in configuration: {0}")]
    InvalidPath(#[from] TypeError),

    /// A configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration file could not be read.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    /// Create a configuration error from any message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
