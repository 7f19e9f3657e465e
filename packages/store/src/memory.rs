//! In-memory artifact store.
//!
//! Used for tests and for seeding small platform stores without a
//! directory tree on disk.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock};

use bytes::Bytes;

use crate::{key, ArtifactStore, Definition, Origin, Resource, StoreError};

/// An in-memory store over a sorted key map.
pub struct MemoryStore {
    root_name: String,
    entries: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store with the given root name.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert bytes under a key, replacing any previous entry.
    pub fn insert(&self, key: &str, bytes: Bytes) -> Result<(), StoreError> {
        key::split_key(key)?;
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), bytes);
        Ok(())
    }

    /// Remove the entry under a key, if present.
    pub fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn locator(&self, key: &str) -> String {
        format!("mem:{}/{}", self.root_name, key)
    }
}

impl ArtifactStore for MemoryStore {
    fn root_name(&self) -> &str {
        &self.root_name
    }

    fn definition(&self, key: &str) -> Result<Option<Definition>, StoreError> {
        key::split_key(key)?;
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).map(|bytes| {
            Definition::new(
                key,
                bytes.clone(),
                Origin::new(&self.root_name, self.locator(key)),
            )
        }))
    }

    fn resource(&self, key: &str) -> Result<Option<Resource>, StoreError> {
        key::split_key(key)?;
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .get(key)
            .map(|bytes| Resource::memory(key, self.locator(key), bytes.clone())))
    }

    fn list_paths(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut prefixes = BTreeSet::new();
        for key in entries.keys() {
            for (i, c) in key.char_indices() {
                if c == '/' {
                    prefixes.insert(key[..i].to_string());
                }
            }
        }
        let mut paths = vec![String::new()];
        paths.extend(prefixes);
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_lookup() {
        let store = MemoryStore::new("mem");
        store.insert("a/B.def", Bytes::from_static(b"x")).unwrap();

        let def = store.definition("a/B.def").unwrap().unwrap();
        assert_eq!(def.origin().locator(), "mem:mem/a/B.def");
        assert!(store.definition("a/C.def").unwrap().is_none());

        store.remove("a/B.def");
        assert!(store.definition("a/B.def").unwrap().is_none());
    }

    #[test]
    fn bad_key_rejected_on_insert() {
        let store = MemoryStore::new("mem");
        assert!(store.insert("", Bytes::new()).is_err());
        assert!(store.insert("/abs", Bytes::new()).is_err());
    }

    #[test]
    fn list_paths_derives_prefixes_root_first() {
        let store = MemoryStore::new("mem");
        store.insert("a/b/C.def", Bytes::new()).unwrap();
        store.insert("a/D.def", Bytes::new()).unwrap();
        store.insert("top.def", Bytes::new()).unwrap();

        assert_eq!(store.list_paths().unwrap(), vec!["", "a", "a/b"]);
    }
}
