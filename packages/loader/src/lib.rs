//! modweave-loader: Concurrent Delegating Loader Core
//!
//! A loader resolves artifact names to materialized artifacts, resources,
//! and namespaces, possibly by delegating to other loaders. Loaders form
//! an arbitrary graph - delegation cycles included - and every operation
//! is safely callable from any number of threads.
//!
//! ## Why deadlock cannot happen here
//!
//! Naive hierarchical loaders serialize loading on a per-loader lock, so
//! two loaders delegating to each other from two threads each hold one
//! lock while blocking on the other. This crate never does that: no
//! operation holds a loader-owned lock while invoking another loader.
//! Instead,
//!
//! - materialization is **retry-on-race**: racing definers for one name
//!   converge through [`Loader::define_or_fetch`] on a single artifact,
//!   and the losing definer gets the winner's artifact rather than an
//!   error;
//! - system routing is a **stateless prefix check** over immutable data,
//!   not a call into a possibly-locked peer;
//! - the namespace registry suppresses nested lookups on the defining
//!   thread, dodging an AB-BA hazard against the platform-wide table.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use modweave_loader::{Loader, StoreFinder, SystemContext};
//! use modweave_store::MemoryStore;
//!
//! let store = MemoryStore::new("app");
//! store.insert("app/core/Engine.def", Bytes::from_static(b"\0asm")).unwrap();
//!
//! let loader = Loader::new(
//!     "app",
//!     Arc::new(SystemContext::unrouted()),
//!     StoreFinder::new(store),
//! );
//!
//! let artifact = loader.load("app.core.Engine").unwrap();
//! assert_eq!(artifact.bytes().as_ref(), b"\0asm");
//!
//! // Missing artifacts fail NotFound; that is the only way a load fails
//! // when the stores themselves are healthy.
//! assert!(loader.load("app.core.Missing").unwrap_err().is_not_found());
//! ```

mod artifact;
mod error;
mod loader;
mod name;
mod namespace;
mod redirect;
mod registry;
mod store_finder;
mod system;

pub use artifact::Artifact;
pub use error::LoadError;
pub use loader::{Finder, LoadOptions, Loader};
pub use name::{ArtifactName, NameError};
pub use namespace::{Namespace, NamespaceDescriptor, NamespaceMeta};
pub use redirect::RedirectingLoader;
pub use registry::{GlobalNamespaceTable, NamespaceRegistry, NamespaceTable, TableOutcome};
pub use store_finder::StoreFinder;
pub use system::{
    NullAuthority, PlatformAuthority, StoreAuthority, SystemContext, SystemPrefixes,
};

// Re-export store types that appear in this crate's API.
pub use modweave_store::{Origin, Resource};
