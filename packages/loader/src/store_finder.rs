//! The shipped finder: local store first, then delegates.

use tracing::trace;

use modweave_store::{ArtifactStore, Resource};

use std::sync::{Arc, PoisonError, RwLock};

use crate::artifact::Artifact;
use crate::error::LoadError;
use crate::loader::{Finder, LoadOptions, Loader};
use crate::name::ArtifactName;
use crate::namespace::NamespaceDescriptor;

/// A finder that consults one artifact store and an already-resolved
/// list of delegate loaders.
///
/// Delegation is by composition: delegates are held `Arc<Loader>`
/// references, tried in order with exported-only loads. The delegate
/// list is snapshotted under its lock and the lock released before any
/// delegate is entered, honoring the loader-wide rule of never calling
/// out while holding a lock. Keeping the list behind a lock also lets
/// delegation cycles be wired up after the loaders exist.
pub struct StoreFinder {
    store: Box<dyn ArtifactStore>,
    delegates: RwLock<Vec<Arc<Loader>>>,
    exported_paths: Option<Vec<String>>,
}

impl StoreFinder {
    /// A finder over a store with no delegates.
    pub fn new(store: impl ArtifactStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            delegates: RwLock::new(Vec::new()),
            exported_paths: None,
        }
    }

    /// Set the resolved delegate list, tried in order after the local
    /// store.
    pub fn with_delegates(self, delegates: Vec<Arc<Loader>>) -> Self {
        *self
            .delegates
            .write()
            .unwrap_or_else(PoisonError::into_inner) = delegates;
        self
    }

    /// Append a delegate, e.g. to close a delegation cycle.
    pub fn add_delegate(&self, delegate: Arc<Loader>) {
        self.delegates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delegate);
    }

    fn delegates(&self) -> Vec<Arc<Loader>> {
        self.delegates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Restrict exported-only loads to names and resources under the
    /// given `/`-joined path prefixes. Without a filter everything is
    /// exported.
    pub fn with_exported_paths(mut self, paths: Vec<String>) -> Self {
        self.exported_paths = Some(paths);
        self
    }

    fn name_exported(&self, name: &ArtifactName) -> bool {
        match &self.exported_paths {
            None => true,
            Some(paths) => {
                let dir = name
                    .namespace()
                    .map(|ns| ns.replace('.', "/"))
                    .unwrap_or_default();
                paths.iter().any(|p| dir.starts_with(p.as_str()))
            }
        }
    }

    fn path_exported(&self, name: &str) -> bool {
        match &self.exported_paths {
            None => true,
            Some(paths) => paths.iter().any(|p| name.starts_with(p.as_str())),
        }
    }
}

impl Finder for StoreFinder {
    fn find_artifact(
        &self,
        loader: &Loader,
        name: &ArtifactName,
        options: LoadOptions,
    ) -> Result<Arc<Artifact>, LoadError> {
        let visible_locally = !options.exported_only || self.name_exported(name);
        if visible_locally {
            if let Some(path) = name.definition_path() {
                if let Some(definition) = self.store.definition(&path)? {
                    trace!(loader = loader.name(), artifact = %name, "materializing from local store");
                    if let Some(namespace) = name.namespace() {
                        loader.define_namespace(NamespaceDescriptor::new(namespace));
                    }
                    let origin = definition.origin().clone();
                    return loader.define_or_fetch_bytes(
                        name,
                        definition.into_bytes(),
                        Some(origin),
                    );
                }
            }
        }
        for delegate in self.delegates() {
            let delegated = LoadOptions {
                exported_only: true,
                resolve: options.resolve,
            };
            match delegate.load_name(name, delegated) {
                Ok(artifact) => return Ok(artifact),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(LoadError::NotFound(name.clone()))
    }

    fn find_resource(
        &self,
        loader: &Loader,
        name: &str,
        exported_only: bool,
    ) -> Result<Option<Resource>, LoadError> {
        let _ = loader;
        if !exported_only || self.path_exported(name) {
            if let Some(resource) = self.store.resource(name)? {
                return Ok(Some(resource));
            }
        }
        for delegate in self.delegates() {
            if let Some(resource) = delegate.get_resource(name)? {
                return Ok(Some(resource));
            }
        }
        Ok(None)
    }

    fn find_resources(
        &self,
        loader: &Loader,
        name: &str,
        exported_only: bool,
    ) -> Result<Vec<Resource>, LoadError> {
        let _ = loader;
        let mut resources = Vec::new();
        if !exported_only || self.path_exported(name) {
            if let Some(resource) = self.store.resource(name)? {
                resources.push(resource);
            }
        }
        for delegate in self.delegates() {
            resources.extend(delegate.get_resources(name)?);
        }
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name;
    use crate::registry::GlobalNamespaceTable;
    use crate::system::SystemContext;
    use bytes::Bytes;
    use modweave_store::MemoryStore;

    fn loader_over(store: MemoryStore) -> Loader {
        Loader::with_namespace_table(
            "test",
            Arc::new(SystemContext::unrouted()),
            Arc::new(GlobalNamespaceTable::new()),
            StoreFinder::new(store),
        )
    }

    fn seeded(entries: &[(&str, &[u8])]) -> MemoryStore {
        let store = MemoryStore::new("seed");
        for (key, bytes) in entries {
            store.insert(key, Bytes::copy_from_slice(bytes)).unwrap();
        }
        store
    }

    #[test]
    fn load_materializes_from_store() {
        let loader = loader_over(seeded(&[("app/core/Engine.def", b"code")]));

        let artifact = loader.load("app.core.Engine").unwrap();
        assert_eq!(artifact.bytes().as_ref(), b"code");
        assert_eq!(artifact.origin().unwrap().root_name(), "seed");

        // Loading defines the artifact's namespace as a side effect.
        assert!(loader.get_namespace("app.core").is_some());
    }

    #[test]
    fn load_missing_fails_not_found() {
        let loader = loader_over(seeded(&[]));
        assert!(loader.load("app.Missing").unwrap_err().is_not_found());
    }

    #[test]
    fn repeated_loads_converge() {
        let loader = loader_over(seeded(&[("app/Engine.def", b"code")]));
        let first = loader.load("app.Engine").unwrap();
        let second = loader.load("app.Engine").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn delegation_tries_delegates_in_order() {
        let lib = Arc::new(loader_over(seeded(&[("lib/Util.def", b"util")])));
        let app_store = seeded(&[("app/Main.def", b"main")]);
        let app = Loader::with_namespace_table(
            "app",
            Arc::new(SystemContext::unrouted()),
            Arc::new(GlobalNamespaceTable::new()),
            StoreFinder::new(app_store).with_delegates(vec![Arc::clone(&lib)]),
        );

        // Local store wins for local names.
        assert_eq!(app.load("app.Main").unwrap().bytes().as_ref(), b"main");

        // Delegated names materialize in the delegate, not locally.
        let util = app.load("lib.Util").unwrap();
        assert!(Arc::ptr_eq(&util, &lib.fetch_defined(&name!("lib.Util")).unwrap()));
        assert!(app.fetch_defined(&name!("lib.Util")).is_none());
    }

    #[test]
    fn exported_filter_hides_private_names_from_delegation() {
        let lib_store = seeded(&[
            ("lib/api/Api.def", b"api"),
            ("lib/internal/Secret.def", b"secret"),
        ]);
        let lib = Arc::new(Loader::with_namespace_table(
            "lib",
            Arc::new(SystemContext::unrouted()),
            Arc::new(GlobalNamespaceTable::new()),
            StoreFinder::new(lib_store).with_exported_paths(vec!["lib/api".to_string()]),
        ));
        let app = Loader::with_namespace_table(
            "app",
            Arc::new(SystemContext::unrouted()),
            Arc::new(GlobalNamespaceTable::new()),
            StoreFinder::new(seeded(&[])).with_delegates(vec![Arc::clone(&lib)]),
        );

        // Exported names flow through delegation; private ones do not.
        assert!(app.load("lib.api.Api").is_ok());
        assert!(app.load("lib.internal.Secret").unwrap_err().is_not_found());

        // A direct, non-exported load on the owner still sees them.
        assert!(lib.load("lib.internal.Secret").is_ok());
    }

    #[test]
    fn resource_lookup_falls_through_to_delegates() {
        let lib = Arc::new(loader_over(seeded(&[("cfg/lib.toml", b"lib cfg")])));
        let app = Loader::with_namespace_table(
            "app",
            Arc::new(SystemContext::unrouted()),
            Arc::new(GlobalNamespaceTable::new()),
            StoreFinder::new(seeded(&[("cfg/app.toml", b"app cfg")]))
                .with_delegates(vec![lib]),
        );

        assert_eq!(
            app.get_resource_bytes("cfg/app.toml").unwrap().unwrap().as_ref(),
            b"app cfg"
        );
        assert_eq!(
            app.get_resource_bytes("cfg/lib.toml").unwrap().unwrap().as_ref(),
            b"lib cfg"
        );
        assert!(app.get_resource("cfg/missing.toml").unwrap().is_none());
    }

    #[test]
    fn resources_concatenate_across_the_graph() {
        let lib = Arc::new(loader_over(seeded(&[("cfg/defaults.toml", b"lib")])));
        let app = Loader::with_namespace_table(
            "app",
            Arc::new(SystemContext::unrouted()),
            Arc::new(GlobalNamespaceTable::new()),
            StoreFinder::new(seeded(&[("cfg/defaults.toml", b"app")]))
                .with_delegates(vec![lib]),
        );

        let all = app.get_resources("cfg/defaults.toml").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].bytes().unwrap().as_ref(), b"app");
        assert_eq!(all[1].bytes().unwrap().as_ref(), b"lib");
    }
}
