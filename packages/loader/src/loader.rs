//! The concurrent delegating loader.
//!
//! A loader resolves names to artifacts, resources, and namespaces,
//! possibly by delegating to other loaders. Any number of loaders may
//! delegate to each other in an arbitrary graph, concurrently, without
//! risk of deadlock.
//!
//! The governing invariant: **no operation holds a lock owned by this
//! loader while invoking an operation on a different loader or the
//! platform authority.** The defined-map and registry locks are only
//! held across pure map operations; state is copied out (`Arc` clones)
//! before any call out. Materialization is retry-on-race rather than
//! mutually exclusive - concurrent definers for one name converge on a
//! single artifact through [`Loader::define_or_fetch`] - and system
//! routing is a stateless prefix check over immutable data.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;
use tracing::debug;

use modweave_store::{Origin, Resource};

use crate::artifact::Artifact;
use crate::error::LoadError;
use crate::name::{ArtifactName, NameError};
use crate::namespace::{Namespace, NamespaceDescriptor};
use crate::registry::{self, NamespaceRegistry, NamespaceTable};
use crate::system::SystemContext;

/// Flags for a load request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Consider only exported artifacts.
    pub exported_only: bool,
    /// Link-time hint forwarded to the finder; the shipped store finder
    /// ignores it.
    pub resolve: bool,
}

impl LoadOptions {
    /// Options for an exported-only load, as used on delegate edges.
    pub fn exported() -> Self {
        Self {
            exported_only: true,
            resolve: false,
        }
    }
}

/// Outcome of the define primitive: the single point in the system
/// where a materialization race is decided.
pub(crate) enum DefineOutcome {
    /// This caller won; the artifact is newly materialized.
    Defined(Arc<Artifact>),
    /// Another caller won; this is the existing artifact.
    AlreadyExists(Arc<Artifact>),
    /// The definition itself was unusable; no map entry was made.
    Failed(LoadError),
}

/// Per-loader resolution extension point.
///
/// `Loader` owns the fixed policy - system routing, array synthesis,
/// define convergence - and calls into a `Finder` for everything that
/// varies per loader: consulting a store, walking delegates. Finders
/// receive the owning loader back so they can call
/// [`Loader::define_or_fetch`] and friends.
///
/// A finder must **never** synchronize across a delegation call of any
/// sort; every default below is lock-free and absent.
pub trait Finder: Send + Sync {
    /// Find an artifact, possibly delegating to other loaders.
    ///
    /// Materialization from bytes must go through
    /// [`Loader::define_or_fetch`] rather than any exclusive scheme, so
    /// racing callers converge instead of observing spurious conflicts.
    fn find_artifact(
        &self,
        loader: &Loader,
        name: &ArtifactName,
        options: LoadOptions,
    ) -> Result<Arc<Artifact>, LoadError> {
        let _ = (loader, options);
        Err(LoadError::NotFound(name.clone()))
    }

    /// Find a resource by path.
    fn find_resource(
        &self,
        loader: &Loader,
        name: &str,
        exported_only: bool,
    ) -> Result<Option<Resource>, LoadError> {
        let _ = (loader, name, exported_only);
        Ok(None)
    }

    /// Enumerate all resources under a path. The result is finite and
    /// restartable.
    fn find_resources(
        &self,
        loader: &Loader,
        name: &str,
        exported_only: bool,
    ) -> Result<Vec<Resource>, LoadError> {
        let _ = (loader, name, exported_only);
        Ok(Vec::new())
    }

    /// Resolve a namespace visible to this loader: the local registry
    /// first, then the platform-wide table.
    fn namespace_by_name(&self, loader: &Loader, name: &str) -> Option<Arc<Namespace>> {
        loader
            .registry()
            .lookup(name)
            .or_else(|| loader.registry().platform_lookup(name))
    }
}

// A shared finder handle is still a finder. This is how delegation
// cycles get wired up: keep an `Arc` to the finder, hand a clone to the
// loader, and add delegates through the retained handle afterwards.
impl<T: Finder + ?Sized> Finder for Arc<T> {
    fn find_artifact(
        &self,
        loader: &Loader,
        name: &ArtifactName,
        options: LoadOptions,
    ) -> Result<Arc<Artifact>, LoadError> {
        self.as_ref().find_artifact(loader, name, options)
    }

    fn find_resource(
        &self,
        loader: &Loader,
        name: &str,
        exported_only: bool,
    ) -> Result<Option<Resource>, LoadError> {
        self.as_ref().find_resource(loader, name, exported_only)
    }

    fn find_resources(
        &self,
        loader: &Loader,
        name: &str,
        exported_only: bool,
    ) -> Result<Vec<Resource>, LoadError> {
        self.as_ref().find_resources(loader, name, exported_only)
    }

    fn namespace_by_name(&self, loader: &Loader, name: &str) -> Option<Arc<Namespace>> {
        self.as_ref().namespace_by_name(loader, name)
    }
}

/// A name-resolution authority: the concurrency core of modweave.
///
/// Every public operation is safely callable from any number of threads
/// without external synchronization. Blocking happens only for genuine
/// store I/O, never across a delegation boundary.
pub struct Loader {
    name: String,
    system: Arc<SystemContext>,
    finder: Box<dyn Finder>,
    defined: RwLock<HashMap<ArtifactName, Arc<Artifact>>>,
    registry: NamespaceRegistry,
}

impl Loader {
    /// Create a loader routing namespace defines through the shared
    /// process-wide table.
    pub fn new(
        name: impl Into<String>,
        system: Arc<SystemContext>,
        finder: impl Finder + 'static,
    ) -> Self {
        Self::with_namespace_table(
            name,
            system,
            crate::registry::GlobalNamespaceTable::shared(),
            finder,
        )
    }

    /// Create a loader with an explicit platform namespace table.
    pub fn with_namespace_table(
        name: impl Into<String>,
        system: Arc<SystemContext>,
        table: Arc<dyn NamespaceTable>,
        finder: impl Finder + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            system,
            finder: Box::new(finder),
            defined: RwLock::new(HashMap::new()),
            registry: NamespaceRegistry::new(table),
        }
    }

    /// This loader's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The routing context this loader consults.
    pub fn system(&self) -> &Arc<SystemContext> {
        &self.system
    }

    /// This loader's namespace registry.
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// Load the artifact with the given name.
    ///
    /// Fails with [`LoadError::NotFound`] if neither the system-prefix
    /// bypass nor the finder succeeds.
    pub fn load(&self, name: &str) -> Result<Arc<Artifact>, LoadError> {
        self.load_opts(name, LoadOptions::default())
    }

    /// Same as [`Loader::load`], except only exported artifacts are
    /// considered.
    pub fn load_exported(&self, name: &str) -> Result<Arc<Artifact>, LoadError> {
        self.load_opts(name, LoadOptions::exported())
    }

    /// Load with explicit options.
    pub fn load_opts(&self, name: &str, options: LoadOptions) -> Result<Arc<Artifact>, LoadError> {
        if name.is_empty() {
            return Err(NameError::Empty.into());
        }
        let parsed = ArtifactName::parse(name)?;
        self.load_name(&parsed, options)
    }

    /// Load an already-parsed name.
    pub fn load_name(
        &self,
        name: &ArtifactName,
        options: LoadOptions,
    ) -> Result<Arc<Artifact>, LoadError> {
        match name {
            ArtifactName::Scalar(scalar) => {
                if self.system.prefixes().matches_name(scalar) {
                    return self.system.authority().load_artifact(name);
                }
                self.finder.find_artifact(self, name, options)
            }
            ArtifactName::Array(element_name) => {
                // Array names are synthesized from the visible element
                // type, never looked up in a store. The synthesized
                // artifact still converges through the defined-map so
                // racing callers observe one identity.
                if let Some(existing) = self.fetch_defined(name) {
                    return Ok(existing);
                }
                let element = self.load_name(element_name, options)?;
                match self.define(Artifact::array_of(element)) {
                    DefineOutcome::Defined(artifact)
                    | DefineOutcome::AlreadyExists(artifact) => Ok(artifact),
                    DefineOutcome::Failed(e) => Err(e),
                }
            }
        }
    }

    /// Atomically define or fetch the named artifact from a byte range.
    ///
    /// If materialization fails solely because the name is already
    /// materialized - a benign race - the existing artifact is fetched
    /// and returned instead of surfacing a conflict. Any other failure
    /// propagates. This is the only cross-step atomicity guarantee in
    /// the system; there is no broader transaction concept.
    pub fn define_or_fetch(
        &self,
        name: &ArtifactName,
        bytes: &[u8],
        offset: usize,
        len: usize,
        origin: Option<Origin>,
    ) -> Result<Arc<Artifact>, LoadError> {
        let outcome = match checked_slice(bytes, offset, len) {
            Ok(slice) => self.define(Artifact::new(
                name.clone(),
                Bytes::copy_from_slice(slice),
                origin,
            )),
            Err(e) => DefineOutcome::Failed(e),
        };
        self.normalize(name, outcome)
    }

    /// Atomically define or fetch the named artifact from whole-buffer
    /// bytes, without copying.
    pub fn define_or_fetch_bytes(
        &self,
        name: &ArtifactName,
        bytes: Bytes,
        origin: Option<Origin>,
    ) -> Result<Arc<Artifact>, LoadError> {
        let outcome = self.define(Artifact::new(name.clone(), bytes, origin));
        self.normalize(name, outcome)
    }

    /// Fetch an artifact already defined by this loader, without any
    /// delegation.
    pub fn fetch_defined(&self, name: &ArtifactName) -> Option<Arc<Artifact>> {
        self.defined
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Look up a resource, delegating reserved paths to the platform
    /// authority unconditionally.
    ///
    /// Absent is `Ok(None)`; only store failures are errors.
    pub fn get_resource(&self, name: &str) -> Result<Option<Resource>, LoadError> {
        if name.is_empty() {
            return Err(NameError::Empty.into());
        }
        if self.system.prefixes().matches_path(name) {
            return self.system.authority().resource(name);
        }
        self.finder.find_resource(self, name, false)
    }

    /// Enumerate all resources visible under a path.
    pub fn get_resources(&self, name: &str) -> Result<Vec<Resource>, LoadError> {
        if name.is_empty() {
            return Err(NameError::Empty.into());
        }
        if self.system.prefixes().matches_path(name) {
            return self.system.authority().resources(name);
        }
        self.finder.find_resources(self, name, false)
    }

    /// Look up a resource and read its content.
    pub fn get_resource_bytes(&self, name: &str) -> Result<Option<Bytes>, LoadError> {
        match self.get_resource(name)? {
            Some(resource) => Ok(Some(resource.bytes()?)),
            None => Ok(None),
        }
    }

    /// Look up a namespace visible to this loader.
    ///
    /// Reserved names route to the platform authority. While a define on
    /// this thread is in flight, lookups short-circuit to absent instead
    /// of re-entering the delegating path (see the registry docs for the
    /// lock-order hazard this avoids).
    pub fn get_namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        let dotted = format!("{}.", name);
        if self.system.prefixes().matches_name(&dotted) {
            return self.system.authority().namespace(name);
        }
        if registry::lookup_suppressed() {
            return None;
        }
        self.finder.namespace_by_name(self, name)
    }

    /// Define a namespace in this loader, returning the existing one if
    /// already defined.
    pub fn define_namespace(&self, descriptor: NamespaceDescriptor) -> Arc<Namespace> {
        self.registry.define(descriptor)
    }

    /// All namespaces defined by this loader.
    pub fn namespaces(&self) -> Vec<Arc<Namespace>> {
        self.registry.all()
    }

    /// The define primitive: insert-if-absent on the defined-map.
    ///
    /// The write lock covers only the map entry; no code is invoked
    /// under it.
    fn define(&self, artifact: Artifact) -> DefineOutcome {
        let artifact = Arc::new(artifact);
        let mut map = self
            .defined
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match map.entry(artifact.name().clone()) {
            Entry::Occupied(entry) => DefineOutcome::AlreadyExists(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&artifact));
                DefineOutcome::Defined(artifact)
            }
        }
    }

    /// Collapse a define outcome into the single success path.
    fn normalize(
        &self,
        name: &ArtifactName,
        outcome: DefineOutcome,
    ) -> Result<Arc<Artifact>, LoadError> {
        match outcome {
            DefineOutcome::Defined(artifact) => Ok(artifact),
            DefineOutcome::AlreadyExists(existing) => {
                debug!(loader = %self.name, artifact = %name, "duplicate definition discarded");
                Ok(existing)
            }
            DefineOutcome::Failed(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader").field("name", &self.name).finish()
    }
}

fn checked_slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], LoadError> {
    let out_of_range = || LoadError::InvalidRange {
        offset,
        len,
        actual: bytes.len(),
    };
    let end = offset.checked_add(len).ok_or_else(out_of_range)?;
    if end > bytes.len() {
        return Err(out_of_range());
    }
    Ok(&bytes[offset..end])
}
