//! System-prefix routing, not-found semantics, and namespace lookup
//! suppression during platform callbacks.

use std::sync::{Arc, Mutex, OnceLock};

use bytes::Bytes;
use modweave_loader::{
    GlobalNamespaceTable, Loader, Namespace, NamespaceDescriptor, NamespaceTable, StoreAuthority,
    StoreFinder, SystemContext, SystemPrefixes, TableOutcome,
};
use modweave_store::MemoryStore;

fn seeded(root: &str, entries: &[(&str, &[u8])]) -> MemoryStore {
    let store = MemoryStore::new(root);
    for (key, bytes) in entries {
        store.insert(key, Bytes::copy_from_slice(bytes)).unwrap();
    }
    store
}

fn routed_app_loader() -> Loader {
    let platform = seeded(
        "platform",
        &[
            ("platform/core/Sys.def", b"platform code"),
            ("platform/cfg/defaults.toml", b"platform cfg"),
        ],
    );
    let authority = StoreAuthority::over_store(Arc::new(platform));
    let context = Arc::new(SystemContext::new(
        SystemPrefixes::new(["platform."], ["platform/"]),
        Arc::new(authority),
    ));

    // The local store also carries entries under the reserved prefix;
    // they must never win.
    let app = seeded(
        "app",
        &[
            ("platform/core/Sys.def", b"shadowed"),
            ("platform/cfg/defaults.toml", b"shadowed cfg"),
            ("app/Main.def", b"app code"),
        ],
    );
    Loader::with_namespace_table(
        "app",
        context,
        Arc::new(GlobalNamespaceTable::new()),
        StoreFinder::new(app),
    )
}

#[test]
fn reserved_names_always_route_to_the_platform_authority() {
    let loader = routed_app_loader();

    let artifact = loader.load("platform.core.Sys").unwrap();
    assert_eq!(artifact.bytes().as_ref(), b"platform code");
    assert_eq!(artifact.origin().unwrap().root_name(), "platform");

    // The bypass is terminal: nothing materialized locally.
    let name = modweave_loader::name!("platform.core.Sys");
    assert!(loader.fetch_defined(&name).is_none());

    // Resources and namespaces route the same way.
    let cfg = loader.get_resource_bytes("platform/cfg/defaults.toml").unwrap();
    assert_eq!(cfg.unwrap().as_ref(), b"platform cfg");
    let ns = loader.get_namespace("platform.core").unwrap();
    assert_eq!(ns.name(), "platform.core");
}

#[test]
fn unreserved_names_resolve_locally() {
    let loader = routed_app_loader();
    let artifact = loader.load("app.Main").unwrap();
    assert_eq!(artifact.bytes().as_ref(), b"app code");
    assert_eq!(artifact.origin().unwrap().root_name(), "app");
}

#[test]
fn not_found_semantics() {
    let loader = routed_app_loader();

    // Absent resource: a normal empty result, not an error.
    assert!(loader.get_resource("missing/thing.toml").unwrap().is_none());

    // Absent artifact: a NotFound error.
    assert!(loader.load("app.Missing").unwrap_err().is_not_found());

    // Reserved but absent: the authority's NotFound, still NotFound.
    assert!(loader.load("platform.Missing").unwrap_err().is_not_found());
}

/// A platform table that calls back into the defining loader's
/// namespace lookup from inside `define`, as the real platform may do
/// while holding its own table lock. The nested lookup must observe
/// absent instead of re-entering the delegating path.
struct CallbackTable {
    loader: OnceLock<Arc<Loader>>,
    observed: Mutex<Vec<Option<String>>>,
    inner: GlobalNamespaceTable,
}

impl CallbackTable {
    fn new() -> Self {
        Self {
            loader: OnceLock::new(),
            observed: Mutex::new(Vec::new()),
            inner: GlobalNamespaceTable::new(),
        }
    }
}

impl NamespaceTable for CallbackTable {
    fn define(&self, descriptor: &NamespaceDescriptor) -> TableOutcome {
        if let Some(loader) = self.loader.get() {
            let nested = loader.get_namespace(&descriptor.name);
            self.observed
                .lock()
                .unwrap()
                .push(nested.map(|ns| ns.name().to_string()));
        }
        self.inner.define(descriptor)
    }

    fn lookup(&self, name: &str) -> Option<Arc<Namespace>> {
        self.inner.lookup(name)
    }
}

#[test]
fn nested_namespace_lookup_is_suppressed_during_define() {
    let table = Arc::new(CallbackTable::new());
    let platform: Arc<dyn NamespaceTable> = Arc::clone(&table) as Arc<dyn NamespaceTable>;
    let loader = Arc::new(Loader::with_namespace_table(
        "app",
        Arc::new(SystemContext::unrouted()),
        platform,
        StoreFinder::new(seeded("app", &[])),
    ));
    table.loader.set(Arc::clone(&loader)).ok().unwrap();

    let defined = loader.define_namespace(NamespaceDescriptor::new("app.core"));
    assert_eq!(defined.name(), "app.core");

    // The callback ran and its nested lookup short-circuited to absent.
    let observed = table.observed.lock().unwrap();
    assert_eq!(observed.as_slice(), &[None]);
    drop(observed);

    // Outside the define, the lookup resolves normally.
    assert_eq!(
        loader.get_namespace("app.core").unwrap().name(),
        "app.core"
    );
}
