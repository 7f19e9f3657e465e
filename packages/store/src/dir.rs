//! Directory-tree backed artifact store.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::{index, key, ArtifactStore, Definition, Origin, Resource, StoreError};

/// An artifact store over a directory tree.
///
/// Keys map directly to files under the root; the root is validated and
/// canonicalized at construction so later lookups can only fail for
/// genuine I/O reasons. Path enumeration is backed by a persisted
/// sidecar index (see [`DirStore::list_paths`]).
#[derive(Debug)]
pub struct DirStore {
    root_name: String,
    root: PathBuf,
    persist_index: bool,
}

impl DirStore {
    /// Open a store over an existing directory.
    ///
    /// Fails with [`StoreError::RootInvalid`] when the path is missing
    /// or not a directory. Index persistence is enabled by default.
    pub fn open(root_name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let attr = fs::metadata(&root).map_err(|e| StoreError::RootInvalid {
            path: root.clone(),
            source: e,
        })?;
        if !attr.is_dir() {
            return Err(StoreError::RootInvalid {
                path: root,
                source: std::io::Error::other("store root must be a directory"),
            });
        }
        let root = root.canonicalize().map_err(|e| StoreError::RootInvalid {
            path: root.clone(),
            source: e,
        })?;
        Ok(Self {
            root_name: root_name.into(),
            root,
            persist_index: true,
        })
    }

    /// Enable or disable sidecar index persistence.
    pub fn with_index_persistence(mut self, enabled: bool) -> Self {
        self.persist_index = enabled;
        self
    }

    /// The canonicalized store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stat_file(&self, key: &str) -> Result<Option<PathBuf>, StoreError> {
        let path = key::resolve(&self.root, key)?;
        match fs::metadata(&path) {
            Ok(attr) if attr.is_file() => Ok(Some(path)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

impl ArtifactStore for DirStore {
    fn root_name(&self) -> &str {
        &self.root_name
    }

    fn definition(&self, key: &str) -> Result<Option<Definition>, StoreError> {
        let Some(path) = self.stat_file(key)? else {
            return Ok(None);
        };
        let bytes = fs::read(&path).map_err(|e| StoreError::io(path.clone(), e))?;
        let origin = Origin::new(&self.root_name, format!("file:{}", path.display()));
        Ok(Some(Definition::new(key, Bytes::from(bytes), origin)))
    }

    fn resource(&self, key: &str) -> Result<Option<Resource>, StoreError> {
        Ok(self.stat_file(key)?.map(|path| Resource::file(key, path)))
    }

    /// Enumerate directory prefixes under the root.
    ///
    /// A present, readable `<root>.index` sidecar is returned verbatim
    /// with no freshness check against current contents - staleness is
    /// an accepted trade-off for avoiding a walk per call. Otherwise the
    /// tree is walked once (root `""` first, depth-first, directories
    /// only) and, when persistence is enabled, the result is written to
    /// the sidecar. A persist failure is swallowed and the computed list
    /// is still returned; nothing is retained in memory for future
    /// calls.
    fn list_paths(&self) -> Result<Vec<String>, StoreError> {
        let sidecar = index::sidecar_path(&self.root);
        if let Some(paths) = index::read(&sidecar) {
            return Ok(paths);
        }
        let paths = index::build(&self.root);
        if self.persist_index {
            index::persist(&sidecar, &paths);
        }
        Ok(paths)
    }
}
