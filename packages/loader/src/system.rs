//! System-prefix routing to the platform authority.
//!
//! A process-wide, read-only set of reserved name and path prefixes is
//! consulted by every loader before any of its own resolution. Matching
//! names always route to one designated platform authority, so a
//! reserved name has exactly one materialized identity platform-wide.
//! The check itself is a stateless read over immutable data - no lock is
//! taken and no peer loader is entered, which keeps it off every
//! deadlock cycle.

use std::sync::{Arc, OnceLock};

use modweave_store::{ArtifactStore, Resource};

use crate::artifact::Artifact;
use crate::error::LoadError;
use crate::loader::Loader;
use crate::name::ArtifactName;
use crate::namespace::Namespace;

/// Reserved name and path prefixes.
///
/// Prefixes are matched with plain `starts_with`, so entries should
/// include their trailing separator: `platform.` for artifact names,
/// `platform/` for resource paths.
#[derive(Debug, Clone, Default)]
pub struct SystemPrefixes {
    names: Vec<String>,
    paths: Vec<String>,
}

impl SystemPrefixes {
    /// Build a prefix set from name prefixes and path prefixes.
    pub fn new(
        names: impl IntoIterator<Item = impl Into<String>>,
        paths: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// An empty set that never matches.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether an artifact or namespace name is reserved.
    pub fn matches_name(&self, name: &str) -> bool {
        self.names.iter().any(|prefix| name.starts_with(prefix))
    }

    /// Whether a resource path is reserved.
    pub fn matches_path(&self, path: &str) -> bool {
        self.paths.iter().any(|prefix| path.starts_with(prefix))
    }
}

/// The designated platform authority for reserved names.
///
/// The authority resolves directly - it must not route back through the
/// system prefix check, or reserved names would recurse forever.
pub trait PlatformAuthority: Send + Sync {
    /// Load a reserved artifact.
    fn load_artifact(&self, name: &ArtifactName) -> Result<Arc<Artifact>, LoadError>;

    /// Look up a reserved resource.
    fn resource(&self, name: &str) -> Result<Option<Resource>, LoadError>;

    /// Enumerate reserved resources under a name.
    fn resources(&self, name: &str) -> Result<Vec<Resource>, LoadError>;

    /// Look up a reserved namespace.
    fn namespace(&self, name: &str) -> Option<Arc<Namespace>>;
}

/// An authority that has nothing: every lookup is absent.
///
/// The base case for loaders that sit at the platform edge themselves.
pub struct NullAuthority;

impl PlatformAuthority for NullAuthority {
    fn load_artifact(&self, name: &ArtifactName) -> Result<Arc<Artifact>, LoadError> {
        Err(LoadError::NotFound(name.clone()))
    }

    fn resource(&self, _name: &str) -> Result<Option<Resource>, LoadError> {
        Ok(None)
    }

    fn resources(&self, _name: &str) -> Result<Vec<Resource>, LoadError> {
        Ok(Vec::new())
    }

    fn namespace(&self, _name: &str) -> Option<Arc<Namespace>> {
        None
    }
}

/// A platform authority backed by a loader over a platform store.
///
/// The wrapped loader must itself be built with an unrouted
/// [`SystemContext`] (empty prefixes), so authority lookups resolve
/// against the platform store instead of re-entering the prefix check.
pub struct StoreAuthority {
    loader: Arc<Loader>,
}

impl StoreAuthority {
    /// Wrap the platform loader.
    pub fn new(loader: Arc<Loader>) -> Self {
        Self { loader }
    }

    /// Build the conventional platform edge: an unrouted loader named
    /// `platform` over the given store.
    pub fn over_store(store: Arc<dyn ArtifactStore>) -> Self {
        let context = Arc::new(SystemContext::unrouted());
        let loader = Loader::new("platform", context, crate::StoreFinder::new(store));
        Self {
            loader: Arc::new(loader),
        }
    }

    /// The wrapped platform loader.
    pub fn loader(&self) -> &Arc<Loader> {
        &self.loader
    }
}

impl PlatformAuthority for StoreAuthority {
    fn load_artifact(&self, name: &ArtifactName) -> Result<Arc<Artifact>, LoadError> {
        self.loader.load_name(name, Default::default())
    }

    fn resource(&self, name: &str) -> Result<Option<Resource>, LoadError> {
        self.loader.get_resource(name)
    }

    fn resources(&self, name: &str) -> Result<Vec<Resource>, LoadError> {
        self.loader.get_resources(name)
    }

    fn namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.loader.get_namespace(name)
    }
}

/// The process-wide routing context: prefix set plus authority.
///
/// Installed once at startup and read-only thereafter; loaders hold an
/// `Arc` so tests can build isolated contexts without touching the
/// process global.
pub struct SystemContext {
    prefixes: SystemPrefixes,
    authority: Arc<dyn PlatformAuthority>,
}

static INSTALLED: OnceLock<Arc<SystemContext>> = OnceLock::new();

impl SystemContext {
    /// A context routing the given prefixes to the given authority.
    pub fn new(prefixes: SystemPrefixes, authority: Arc<dyn PlatformAuthority>) -> Self {
        Self { prefixes, authority }
    }

    /// A context that never routes: empty prefixes, absent authority.
    pub fn unrouted() -> Self {
        Self {
            prefixes: SystemPrefixes::empty(),
            authority: Arc::new(NullAuthority),
        }
    }

    /// Install the process-wide context. Returns `false` if one was
    /// already installed; the first install wins and is never replaced.
    pub fn install(context: Arc<SystemContext>) -> bool {
        INSTALLED.set(context).is_ok()
    }

    /// The installed process-wide context, if any.
    pub fn installed() -> Option<Arc<SystemContext>> {
        INSTALLED.get().cloned()
    }

    /// The reserved prefix set.
    pub fn prefixes(&self) -> &SystemPrefixes {
        &self.prefixes
    }

    /// The designated platform authority.
    pub fn authority(&self) -> &Arc<dyn PlatformAuthority> {
        &self.authority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matching_uses_trailing_separator() {
        let prefixes = SystemPrefixes::new(["platform."], ["platform/"]);
        assert!(prefixes.matches_name("platform.core.Engine"));
        assert!(!prefixes.matches_name("platformish.Engine"));
        assert!(prefixes.matches_path("platform/cfg/defaults.toml"));
        assert!(!prefixes.matches_path("app/cfg/defaults.toml"));
    }

    #[test]
    fn empty_prefixes_never_match() {
        let prefixes = SystemPrefixes::empty();
        assert!(!prefixes.matches_name("anything"));
        assert!(!prefixes.matches_path("any/path"));
    }

    #[test]
    fn null_authority_is_absent() {
        let authority = NullAuthority;
        let name = ArtifactName::parse("x.Y").unwrap();
        assert!(authority.load_artifact(&name).unwrap_err().is_not_found());
        assert!(authority.resource("x/y").unwrap().is_none());
        assert!(authority.resources("x/y").unwrap().is_empty());
        assert!(authority.namespace("x").is_none());
    }
}
