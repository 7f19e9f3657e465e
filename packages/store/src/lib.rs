//! modweave-store: Artifact Storage Layer
//!
//! This is the storage waist of the modweave stack. A store maps relative
//! string keys to stored bytes and can enumerate the directory-like
//! prefixes under its root. Everything at this level is pure bytes - no
//! artifact semantics, no namespace metadata, no delegation.
//!
//! Lookups that find nothing return `Ok(None)`; an `Err` always means the
//! storage medium itself failed. Loaders above this layer rely on that
//! distinction to keep "absent here, ask a delegate" separate from
//! "storage broke, stop".
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use modweave_store::{ArtifactStore, MemoryStore};
//!
//! let store = MemoryStore::new("seed");
//! store.insert("app/core/Engine.def", Bytes::from_static(b"\0asm")).unwrap();
//!
//! let def = store.definition("app/core/Engine.def").unwrap().unwrap();
//! assert_eq!(def.origin().root_name(), "seed");
//!
//! // Absent keys are a normal empty result, never an error.
//! assert!(store.definition("app/core/Missing.def").unwrap().is_none());
//! ```
//!
//! The directory-backed [`DirStore`] adds a persisted path index: the
//! prefix list computed by [`ArtifactStore::list_paths`] is written to a
//! `<root>.index` sidecar and trusted verbatim on later calls.

pub use bytes::Bytes;

mod definition;
mod dir;
mod error;
mod index;
mod key;
mod memory;
mod resource;
mod traits;

pub use definition::{Definition, Origin};
pub use dir::DirStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use resource::Resource;
pub use traits::ArtifactStore;
