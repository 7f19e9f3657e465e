//! Builds the live loader graph from a [`HostConfig`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use modweave_loader::{
    Loader, StoreAuthority, StoreFinder, SystemContext, SystemPrefixes,
};
use modweave_store::DirStore;

use crate::config::{HostConfig, LoaderConfig};
use crate::error::HostError;

/// The constructed graph: every loader by name, plus the routing
/// context they share.
pub struct LoaderGraph {
    loaders: HashMap<String, Arc<Loader>>,
    context: Arc<SystemContext>,
    entry: Arc<Loader>,
}

impl LoaderGraph {
    /// Build loaders, wire delegates, and set up system routing.
    ///
    /// Construction is two-phase so delegate lists may reference any
    /// loader in the graph, cycles included: all loaders are created
    /// first, then the resolved delegate edges are closed over the
    /// retained finder handles.
    pub fn build(config: &HostConfig) -> Result<Self, HostError> {
        for (i, loader_config) in config.loaders.iter().enumerate() {
            if config.loaders[..i]
                .iter()
                .any(|other| other.name == loader_config.name)
            {
                return Err(HostError::DuplicateLoader {
                    name: loader_config.name.clone(),
                });
            }
        }

        let mut loaders = HashMap::new();
        let mut finders = HashMap::new();

        // The designated platform loader stays unrouted so authority
        // lookups resolve against its store instead of re-entering the
        // prefix check. It joins the graph under its name, so delegate
        // edges to it reference the same instance the authority uses.
        let unrouted = Arc::new(SystemContext::unrouted());
        let context = match &config.system.platform_loader {
            Some(platform_name) => {
                let platform_config = config
                    .loaders
                    .iter()
                    .find(|l| &l.name == platform_name)
                    .ok_or_else(|| HostError::UnknownLoader {
                        name: platform_name.clone(),
                    })?;
                let (platform, finder) = Self::open_loader(platform_config, unrouted)?;
                loaders.insert(platform_name.clone(), Arc::clone(&platform));
                finders.insert(platform_name.clone(), finder);
                Arc::new(SystemContext::new(
                    SystemPrefixes::new(
                        config.system.name_prefixes.clone(),
                        config.system.path_prefixes.clone(),
                    ),
                    Arc::new(StoreAuthority::new(platform)),
                ))
            }
            None => unrouted,
        };

        for loader_config in &config.loaders {
            if loaders.contains_key(&loader_config.name) {
                continue;
            }
            let (loader, finder) = Self::open_loader(loader_config, Arc::clone(&context))?;
            loaders.insert(loader_config.name.clone(), loader);
            finders.insert(loader_config.name.clone(), finder);
        }

        for loader_config in &config.loaders {
            let finder = &finders[&loader_config.name];
            for delegate_name in &loader_config.delegates {
                let delegate =
                    loaders
                        .get(delegate_name)
                        .ok_or_else(|| HostError::UnknownLoader {
                            name: delegate_name.clone(),
                        })?;
                finder.add_delegate(Arc::clone(delegate));
            }
        }

        let entry = Arc::clone(loaders.get(&config.entry_loader).ok_or_else(|| {
            HostError::UnknownLoader {
                name: config.entry_loader.clone(),
            }
        })?);

        info!(
            loaders = loaders.len(),
            entry = %config.entry_loader,
            "loader graph ready"
        );
        Ok(Self {
            loaders,
            context,
            entry,
        })
    }

    fn open_loader(
        config: &LoaderConfig,
        context: Arc<SystemContext>,
    ) -> Result<(Arc<Loader>, Arc<StoreFinder>), HostError> {
        let store = DirStore::open(&config.name, &config.store)?;
        let mut finder = StoreFinder::new(store);
        if let Some(paths) = &config.exported_paths {
            finder = finder.with_exported_paths(paths.clone());
        }
        let finder = Arc::new(finder);
        let loader = Arc::new(Loader::new(
            &config.name,
            context,
            Arc::clone(&finder),
        ));
        Ok((loader, finder))
    }

    /// The loader the entry artifact is loaded through.
    pub fn entry(&self) -> &Arc<Loader> {
        &self.entry
    }

    /// A loader by name.
    pub fn loader(&self, name: &str) -> Option<&Arc<Loader>> {
        self.loaders.get(name)
    }

    /// The routing context shared by the graph.
    pub fn context(&self) -> &Arc<SystemContext> {
        &self.context
    }
}
