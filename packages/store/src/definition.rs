//! Artifact definitions: stored bytes plus origin metadata.

use bytes::Bytes;

/// Where a definition came from.
///
/// Carried on every definition so loaders and diagnostics can report
/// which store produced an artifact without holding a store reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    root_name: String,
    locator: String,
    signer: Option<String>,
}

impl Origin {
    /// Create an origin for the given store root and locator.
    pub fn new(root_name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            locator: locator.into(),
            signer: None,
        }
    }

    /// Attach signer metadata to this origin.
    pub fn with_signer(mut self, signer: impl Into<String>) -> Self {
        self.signer = Some(signer.into());
        self
    }

    /// Display name of the store root this came from.
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Store-specific locator for the stored bytes.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Signer metadata, if the store carries any.
    pub fn signer(&self) -> Option<&str> {
        self.signer.as_deref()
    }
}

/// An immutable unit of stored bytes, ready for a loader to materialize.
#[derive(Debug, Clone)]
pub struct Definition {
    key: String,
    bytes: Bytes,
    origin: Origin,
}

impl Definition {
    /// Create a definition from stored bytes.
    pub fn new(key: impl Into<String>, bytes: Bytes, origin: Origin) -> Self {
        Self {
            key: key.into(),
            bytes,
            origin,
        }
    }

    /// The store key this definition was read from.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Consume the definition, keeping only the bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Origin metadata for the stored bytes.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}
