//! Error types for tollgate-core

use std::path::PathBuf;
use thiserror::Error;

/// Ledger store error type
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing the ledger file failed
    #[error("io error on {path:?}: {source}")]
    Io {
        /// Ledger file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Ledger file exists but is not a valid document
    #[error("corrupt ledger {path:?}: {source}")]
    Corrupt {
        /// Ledger file path
        path: PathBuf,
        /// Parse error
        source: serde_json::Error,
    },

    /// Ledger could not be serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid tracker configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
