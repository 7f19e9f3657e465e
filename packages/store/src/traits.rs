//! The artifact store contract.

use crate::{Definition, Resource, StoreError};

/// Name-indexed artifact storage.
///
/// A store maps relative `/`-joined keys to stored bytes and enumerates
/// the directory-like prefixes under its root. Stores are shared across
/// loader threads, so every operation takes `&self` and must be safely
/// callable concurrently.
///
/// # Absent vs failed
///
/// * `Ok(None)` - the key does not exist. A normal result.
/// * `Err(StoreError)` - the storage medium failed or the key was
///   rejected. Never used for a merely missing key.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Arc<dyn ArtifactStore>`.
pub trait ArtifactStore: Send + Sync {
    /// Display name of this store's root, carried into origin metadata.
    fn root_name(&self) -> &str;

    /// Read the definition bytes stored under `key`.
    fn definition(&self, key: &str) -> Result<Option<Definition>, StoreError>;

    /// Look up the resource entry stored under `key`.
    ///
    /// The returned entry defers content reads until accessed.
    fn resource(&self, key: &str) -> Result<Option<Resource>, StoreError>;

    /// Enumerate the directory-like prefixes under this store's root.
    ///
    /// The root itself is the empty string and comes first, followed by
    /// deeper prefixes in discovery order.
    fn list_paths(&self) -> Result<Vec<String>, StoreError>;
}

// Blanket implementations for references and smart pointers

impl<T: ArtifactStore + ?Sized> ArtifactStore for &T {
    fn root_name(&self) -> &str {
        (**self).root_name()
    }

    fn definition(&self, key: &str) -> Result<Option<Definition>, StoreError> {
        (**self).definition(key)
    }

    fn resource(&self, key: &str) -> Result<Option<Resource>, StoreError> {
        (**self).resource(key)
    }

    fn list_paths(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_paths()
    }
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for Box<T> {
    fn root_name(&self) -> &str {
        self.as_ref().root_name()
    }

    fn definition(&self, key: &str) -> Result<Option<Definition>, StoreError> {
        self.as_ref().definition(key)
    }

    fn resource(&self, key: &str) -> Result<Option<Resource>, StoreError> {
        self.as_ref().resource(key)
    }

    fn list_paths(&self) -> Result<Vec<String>, StoreError> {
        self.as_ref().list_paths()
    }
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for std::sync::Arc<T> {
    fn root_name(&self) -> &str {
        self.as_ref().root_name()
    }

    fn definition(&self, key: &str) -> Result<Option<Definition>, StoreError> {
        self.as_ref().definition(key)
    }

    fn resource(&self, key: &str) -> Result<Option<Resource>, StoreError> {
        self.as_ref().resource(key)
    }

    fn list_paths(&self) -> Result<Vec<String>, StoreError> {
        self.as_ref().list_paths()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use bytes::Bytes;
    use std::sync::Arc;

    #[test]
    fn object_safety_works() {
        let store = MemoryStore::new("t");
        store.insert("a/b.def", Bytes::from_static(b"x")).unwrap();

        let dyn_store: Arc<dyn ArtifactStore> = Arc::new(store);
        assert_eq!(dyn_store.root_name(), "t");
        assert!(dyn_store.definition("a/b.def").unwrap().is_some());
        assert!(dyn_store.definition("a/c.def").unwrap().is_none());
    }

    #[test]
    fn blanket_impls_forward() {
        let store = MemoryStore::new("t");
        store.insert("x.def", Bytes::from_static(b"x")).unwrap();

        let by_ref: &dyn ArtifactStore = &store;
        assert!(by_ref.resource("x.def").unwrap().is_some());

        let boxed: Box<dyn ArtifactStore> = Box::new(store);
        assert_eq!(boxed.list_paths().unwrap(), vec![String::new()]);
    }
}
