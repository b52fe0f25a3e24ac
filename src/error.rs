//! Error types for catalog operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by catalog operations.
///
/// Stale index entries discovered during reconciliation are never reported
/// through this type; they are healed in place. Likewise a refused deletion
/// is a [`DeleteOutcome::Cancelled`](crate::confirm::DeleteOutcome) outcome,
/// not an error.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A name, key, or value argument that cannot be used as given.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Lookup of a catalog, collection, or record that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The index document exists but cannot be understood.
    #[error("corrupt index: {0}")]
    Corrupt(String),

    /// An I/O failure on create/read/write/delete. Propagated, not recovered.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration loading or validation failure.
    #[error("config error: {0}")]
    Config(String),

    /// Reported by an analysis collaborator.
    #[error("analysis error: {0}")]
    Analysis(String),
}

impl CatalogError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn fs(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        CatalogError::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
