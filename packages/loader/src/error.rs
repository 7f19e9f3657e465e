//! Error types for the loader core.

use thiserror::Error;

use modweave_store::StoreError;

use crate::name::{ArtifactName, NameError};

/// Errors produced by loader operations.
///
/// Benign definition races never appear here: `define_or_fetch` absorbs
/// them by returning the already-materialized artifact.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The artifact was absent from the local store and every delegate.
    #[error("artifact not found: {0}")]
    NotFound(ArtifactName),

    /// The name was rejected before any lookup was attempted.
    #[error(transparent)]
    Name(#[from] NameError),

    /// A store failed while the loader was consulting it.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// A definition byte range fell outside the supplied buffer.
    #[error("definition range {offset}+{len} out of bounds for buffer of {actual} bytes")]
    InvalidRange {
        /// Requested start offset.
        offset: usize,
        /// Requested length.
        len: usize,
        /// Actual buffer length.
        actual: usize,
    },
}

impl LoadError {
    /// Whether this error only reports an absent artifact.
    ///
    /// Delegation loops use this to keep searching instead of aborting.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_artifact() {
        let e = LoadError::NotFound(ArtifactName::parse("app.Missing").unwrap());
        assert_eq!(format!("{}", e), "artifact not found: app.Missing");
        assert!(e.is_not_found());
    }

    #[test]
    fn name_error_converts_transparently() {
        let e: LoadError = NameError::Empty.into();
        assert_eq!(format!("{}", e), "artifact name is empty");
        assert!(!e.is_not_found());
    }

    #[test]
    fn range_error_display() {
        let e = LoadError::InvalidRange {
            offset: 4,
            len: 10,
            actual: 8,
        };
        let display = format!("{}", e);
        assert!(display.contains("4+10"));
        assert!(display.contains("8 bytes"));
    }
}
