//! Error types for the storage layer.
//!
//! Absent keys are not errors at this layer. An error here always means
//! either a rejected key or a failing storage medium.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by artifact stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store root could not be opened as a directory.
    #[error("invalid store root {}: {source}", path.display())]
    RootInvalid {
        /// The rejected root path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The storage medium failed while reading or enumerating.
    ///
    /// Distinct from an absent key, which is `Ok(None)`.
    #[error("store io failure at {}: {source}", path.display())]
    Io {
        /// The path being accessed when the failure occurred.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A store key was rejected before any I/O was attempted.
    #[error("invalid store key '{key}': {message}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why the key was rejected.
        message: String,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_key(key: &str, message: impl Into<String>) -> Self {
        StoreError::InvalidKey {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
