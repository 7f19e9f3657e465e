//! Host configuration: the already-resolved loader graph.
//!
//! The host does no dependency or version resolution. The config hands
//! it a finished graph: named loaders over store roots, each with the
//! delegate list some higher-level resolver already decided on.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// One loader over one store root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoaderConfig {
    /// Loader name, referenced by delegate lists.
    pub name: String,
    /// Store root directory.
    pub store: PathBuf,
    /// Names of loaders this one delegates to, in order.
    #[serde(default)]
    pub delegates: Vec<String>,
    /// Exported path prefixes; absent means everything is exported.
    #[serde(default)]
    pub exported_paths: Option<Vec<String>>,
}

/// Reserved-prefix routing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemConfig {
    /// Reserved artifact/namespace name prefixes (with trailing `.`).
    #[serde(default)]
    pub name_prefixes: Vec<String>,
    /// Reserved resource path prefixes (with trailing `/`).
    #[serde(default)]
    pub path_prefixes: Vec<String>,
    /// The loader designated as the platform authority.
    #[serde(default)]
    pub platform_loader: Option<String>,
}

/// The complete host configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// All loaders in the graph.
    pub loaders: Vec<LoaderConfig>,
    /// Reserved-prefix routing.
    #[serde(default)]
    pub system: SystemConfig,
    /// The loader the entry artifact is loaded through.
    pub entry_loader: String,
}

impl HostConfig {
    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, HostError> {
        let text = fs::read_to_string(path).map_err(|e| HostError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| HostError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// The `--store` shorthand: one loader named `main` over one store,
    /// no delegation, no reserved prefixes.
    pub fn single_store(store: PathBuf) -> Self {
        Self {
            loaders: vec![LoaderConfig {
                name: "main".to_string(),
                store,
                delegates: Vec::new(),
                exported_paths: None,
            }],
            system: SystemConfig::default(),
            entry_loader: "main".to_string(),
        }
    }
}
