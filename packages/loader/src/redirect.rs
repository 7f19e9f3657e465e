//! Redirection wrapper: a forwarding proxy with a swappable backing.

use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;

use modweave_store::Resource;

use crate::artifact::Artifact;
use crate::error::LoadError;
use crate::loader::{LoadOptions, Loader};
use crate::namespace::Namespace;

/// A pure forwarding proxy over a swappable backing loader.
///
/// Exposes the same operations as a loader and delegates every call to
/// the current backing, which an administrative
/// [`RedirectingLoader::change_default`] can swap at any time. Calls in
/// flight keep the backing they snapshotted; the swap only affects
/// later calls. The backing reference is copied out before forwarding,
/// so no proxy lock is ever held across a delegated operation.
pub struct RedirectingLoader {
    backing: RwLock<Arc<Loader>>,
}

impl RedirectingLoader {
    /// A proxy initially forwarding to the given loader.
    pub fn new(initial: Arc<Loader>) -> Self {
        Self {
            backing: RwLock::new(initial),
        }
    }

    /// Swap the backing loader, returning the previous one.
    pub fn change_default(&self, next: Arc<Loader>) -> Arc<Loader> {
        let mut backing = self
            .backing
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *backing, next)
    }

    /// Snapshot the current backing loader.
    pub fn current(&self) -> Arc<Loader> {
        Arc::clone(
            &self
                .backing
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Forward a load to the current backing.
    pub fn load(&self, name: &str) -> Result<Arc<Artifact>, LoadError> {
        self.current().load(name)
    }

    /// Forward an options-carrying load to the current backing.
    pub fn load_opts(&self, name: &str, options: LoadOptions) -> Result<Arc<Artifact>, LoadError> {
        self.current().load_opts(name, options)
    }

    /// Forward a resource lookup to the current backing.
    pub fn get_resource(&self, name: &str) -> Result<Option<Resource>, LoadError> {
        self.current().get_resource(name)
    }

    /// Forward a resource enumeration to the current backing.
    pub fn get_resources(&self, name: &str) -> Result<Vec<Resource>, LoadError> {
        self.current().get_resources(name)
    }

    /// Forward a resource read to the current backing.
    pub fn get_resource_bytes(&self, name: &str) -> Result<Option<Bytes>, LoadError> {
        self.current().get_resource_bytes(name)
    }

    /// Forward a namespace lookup to the current backing.
    pub fn get_namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.current().get_namespace(name)
    }
}
