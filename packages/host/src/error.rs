//! Error types for the host binary.

use std::path::PathBuf;

use thiserror::Error;

use modweave_loader::LoadError;
use modweave_store::StoreError;

/// Errors produced while bootstrapping or running a loader graph.
#[derive(Debug, Error)]
pub enum HostError {
    /// The configuration file could not be read.
    #[error("cannot read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("cannot parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A loader name appears more than once in the configuration.
    #[error("duplicate loader name '{name}' in config")]
    DuplicateLoader { name: String },

    /// A delegate or designation references a loader that does not
    /// exist.
    #[error("config references unknown loader '{name}'")]
    UnknownLoader { name: String },

    /// A store failed while the graph was being built.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A load operation failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The entry artifact could not be executed.
    #[error("cannot run entry artifact at {stage}: {message}")]
    Run { stage: &'static str, message: String },
}

impl HostError {
    pub(crate) fn run(stage: &'static str, error: impl std::fmt::Display) -> Self {
        HostError::Run {
            stage,
            message: error.to_string(),
        }
    }

    /// Whether the failure is an absent entry artifact, reported with
    /// its own exit code.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::Load(e) if e.is_not_found())
    }
}
