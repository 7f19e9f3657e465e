//! Per-loader namespace registry with reentrancy suppression.
//!
//! `define` participates in a platform-wide namespace table that may
//! call back into namespace lookup on the defining thread while holding
//! its own lock. An unguarded lookup on that path would re-enter the
//! general delegating lookup and try to take the platform lock the
//! caller already holds - the classic AB-BA ordering hazard. The
//! registry therefore sets a thread-scoped suppression flag around the
//! platform call; nested lookups on the same thread short-circuit to
//! absent instead of recursing. The flag is held by an RAII guard so it
//! clears on every exit path, including unwinds.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use crate::namespace::{Namespace, NamespaceDescriptor};

thread_local! {
    static SUPPRESS_NAMESPACE_LOOKUP: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside a namespace define and nested
/// lookups must short-circuit to absent.
pub(crate) fn lookup_suppressed() -> bool {
    SUPPRESS_NAMESPACE_LOOKUP.with(Cell::get)
}

/// Scoped suppression of namespace lookups on the current thread.
struct SuppressionGuard {
    previous: bool,
}

impl SuppressionGuard {
    fn engage() -> Self {
        let previous = SUPPRESS_NAMESPACE_LOOKUP.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        SUPPRESS_NAMESPACE_LOOKUP.with(|flag| flag.set(previous));
    }
}

/// Outcome of a platform-table define.
pub enum TableOutcome {
    /// The descriptor was installed; this is the new namespace.
    Defined(Arc<Namespace>),
    /// Another definer won; this is the existing namespace.
    AlreadyExists(Arc<Namespace>),
}

impl TableOutcome {
    fn into_namespace(self) -> Arc<Namespace> {
        match self {
            TableOutcome::Defined(ns) | TableOutcome::AlreadyExists(ns) => ns,
        }
    }
}

/// The platform-wide namespace table.
///
/// One table is shared by every loader in the process; registries route
/// their defines through it so a namespace name resolves to one
/// platform-wide instance. Implementations may call back into loader
/// namespace lookup from `define` - the registry's suppression flag
/// keeps that reentrancy safe.
pub trait NamespaceTable: Send + Sync {
    /// Install a descriptor if the name is absent; either way, return
    /// the surviving namespace.
    fn define(&self, descriptor: &NamespaceDescriptor) -> TableOutcome;

    /// Look up a namespace by name.
    fn lookup(&self, name: &str) -> Option<Arc<Namespace>>;
}

/// The default process-wide namespace table.
pub struct GlobalNamespaceTable {
    namespaces: Mutex<HashMap<String, Arc<Namespace>>>,
}

impl GlobalNamespaceTable {
    /// A fresh, empty table.
    pub fn new() -> Self {
        Self {
            namespaces: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide shared instance.
    pub fn shared() -> Arc<dyn NamespaceTable> {
        static SHARED: OnceLock<Arc<GlobalNamespaceTable>> = OnceLock::new();
        let shared = SHARED.get_or_init(|| Arc::new(GlobalNamespaceTable::new()));
        let concrete: Arc<GlobalNamespaceTable> = Arc::clone(shared);
        let table: Arc<dyn NamespaceTable> = concrete;
        table
    }
}

impl Default for GlobalNamespaceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceTable for GlobalNamespaceTable {
    fn define(&self, descriptor: &NamespaceDescriptor) -> TableOutcome {
        let mut map = self
            .namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match map.entry(descriptor.name.clone()) {
            std::collections::hash_map::Entry::Occupied(entry) => {
                TableOutcome::AlreadyExists(Arc::clone(entry.get()))
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                let ns = Arc::new(Namespace::from_descriptor(descriptor));
                entry.insert(Arc::clone(&ns));
                TableOutcome::Defined(ns)
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

/// Per-loader concurrent mapping from namespace name to namespace.
pub struct NamespaceRegistry {
    platform: Arc<dyn NamespaceTable>,
    namespaces: RwLock<HashMap<String, Arc<Namespace>>>,
}

impl NamespaceRegistry {
    /// Create a registry routing defines through the given platform
    /// table.
    pub fn new(platform: Arc<dyn NamespaceTable>) -> Self {
        Self {
            platform,
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    /// Atomically insert-if-absent.
    ///
    /// If the name is already defined the new descriptor is discarded
    /// and the existing namespace is returned - never an error.
    /// Concurrent definers for one name all observe the same instance.
    ///
    /// Namespace lookups on this thread are suppressed for the duration
    /// of the platform call (see module docs); the platform table's
    /// define runs with no registry lock held.
    pub fn define(&self, descriptor: NamespaceDescriptor) -> Arc<Namespace> {
        let _suppress = SuppressionGuard::engage();
        if let Some(existing) = self.lookup(&descriptor.name) {
            return existing;
        }
        let ns = self.platform.define(&descriptor).into_namespace();
        let mut map = self
            .namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(descriptor.name).or_insert(ns))
    }

    /// Look up a locally defined namespace.
    pub fn lookup(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Look up a namespace in the platform-wide table.
    pub fn platform_lookup(&self, name: &str) -> Option<Arc<Namespace>> {
        self.platform.lookup(name)
    }

    /// All namespaces defined through this registry.
    pub fn all(&self) -> Vec<Arc<Namespace>> {
        self.namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NamespaceRegistry {
        NamespaceRegistry::new(Arc::new(GlobalNamespaceTable::new()))
    }

    #[test]
    fn define_then_lookup() {
        let registry = registry();
        let ns = registry.define(NamespaceDescriptor::new("app.core"));
        assert_eq!(ns.name(), "app.core");
        assert!(Arc::ptr_eq(&registry.lookup("app.core").unwrap(), &ns));
        assert!(registry.lookup("app.other").is_none());
    }

    #[test]
    fn redefine_returns_existing() {
        let registry = registry();
        let first = registry.define(NamespaceDescriptor::new("app.core"));
        let second = registry.define(
            NamespaceDescriptor::new("app.core").sealed("file:/elsewhere"),
        );
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!second.is_sealed());
    }

    #[test]
    fn registries_share_platform_instances() {
        let table: Arc<dyn NamespaceTable> = Arc::new(GlobalNamespaceTable::new());
        let a = NamespaceRegistry::new(Arc::clone(&table));
        let b = NamespaceRegistry::new(Arc::clone(&table));

        let from_a = a.define(NamespaceDescriptor::new("shared.ns"));
        let from_b = b.define(NamespaceDescriptor::new("shared.ns"));
        assert!(Arc::ptr_eq(&from_a, &from_b));
    }

    #[test]
    fn concurrent_definers_converge() {
        let registry = Arc::new(registry());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                registry.define(NamespaceDescriptor::new("race.ns"))
            }));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for pair in results.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }

    #[test]
    fn suppression_flag_scoped_to_define() {
        struct Probe {
            observed: Mutex<Option<bool>>,
        }
        impl NamespaceTable for Probe {
            fn define(&self, descriptor: &NamespaceDescriptor) -> TableOutcome {
                *self.observed.lock().unwrap() = Some(lookup_suppressed());
                TableOutcome::Defined(Arc::new(Namespace::from_descriptor(descriptor)))
            }
            fn lookup(&self, _name: &str) -> Option<Arc<Namespace>> {
                None
            }
        }

        let probe = Arc::new(Probe {
            observed: Mutex::new(None),
        });
        let platform: Arc<dyn NamespaceTable> = Arc::clone(&probe) as Arc<dyn NamespaceTable>;
        let registry = NamespaceRegistry::new(platform);

        assert!(!lookup_suppressed());
        registry.define(NamespaceDescriptor::new("probe.ns"));
        assert_eq!(*probe.observed.lock().unwrap(), Some(true));
        assert!(!lookup_suppressed());
    }

    #[test]
    fn suppression_restores_after_panic() {
        let result = std::panic::catch_unwind(|| {
            let _guard = SuppressionGuard::engage();
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(!lookup_suppressed());
    }
}
