//! # Tessera Store Errors
//!
//! [`StoreError`] covers file I/O, index corruption, archive framing and
//! metadata serialization failures of the configuration store and the local
//! repository.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found at path: {0}")]
    FileNotFound(PathBuf),

    #[error("Directory not found at path: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Store index '{path}' is corrupt: {reason}")]
    StoreCorruption { path: PathBuf, reason: String },

    #[error("No such configuration: {0}")]
    NoSuchConfiguration(String),

    #[error("Configuration already installed: {0}")]
    AlreadyInstalled(String),

    #[error("Invalid archive '{path}': {reason}")]
    InvalidArchive { path: PathBuf, reason: String },

    #[error("Serialization of '{path}' failed: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// Helper for creating Io errors, ensuring path is always included.
impl StoreError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        StoreError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }

    pub(crate) fn archive(path: &std::path::Path, reason: impl Into<String>) -> Self {
        StoreError::InvalidArchive {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}
