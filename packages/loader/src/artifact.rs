//! Materialized artifacts.

use std::sync::Arc;

use bytes::Bytes;

use modweave_store::Origin;

use crate::name::ArtifactName;

/// A named, materialized unit of loaded code.
///
/// Artifacts are immutable once defined and are handed out as
/// `Arc<Artifact>`; two loads converging on the same definition observe
/// the same allocation. The defining loader exclusively owns the entry
/// in its defined-map until teardown.
#[derive(Debug)]
pub struct Artifact {
    name: ArtifactName,
    bytes: Bytes,
    origin: Option<Origin>,
    element: Option<Arc<Artifact>>,
}

impl Artifact {
    /// Create an artifact from definition bytes.
    pub fn new(name: ArtifactName, bytes: Bytes, origin: Option<Origin>) -> Self {
        Self {
            name,
            bytes,
            origin,
            element: None,
        }
    }

    /// Synthesize the array artifact for an already-materialized element.
    ///
    /// Array artifacts carry no bytes of their own; they reference the
    /// element artifact they were synthesized from.
    pub fn array_of(element: Arc<Artifact>) -> Self {
        Self {
            name: ArtifactName::array_of(element.name.clone()),
            bytes: Bytes::new(),
            origin: None,
            element: Some(element),
        }
    }

    /// The artifact's name.
    pub fn name(&self) -> &ArtifactName {
        &self.name
    }

    /// The definition bytes. Empty for array artifacts.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Origin metadata, when the artifact came from a store.
    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// The element artifact of an array artifact.
    pub fn element(&self) -> Option<&Arc<Artifact>> {
        self.element.as_ref()
    }

    /// Whether this artifact was synthesized as an array.
    pub fn is_array(&self) -> bool {
        self.element.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_artifact_accessors() {
        let a = Artifact::new(
            ArtifactName::parse("app.Engine").unwrap(),
            Bytes::from_static(b"code"),
            Some(Origin::new("app", "mem:app/Engine.def")),
        );
        assert_eq!(a.name().to_string(), "app.Engine");
        assert_eq!(a.bytes().as_ref(), b"code");
        assert!(!a.is_array());
        assert!(a.element().is_none());
    }

    #[test]
    fn array_artifact_wraps_element() {
        let element = Arc::new(Artifact::new(
            ArtifactName::parse("app.Engine").unwrap(),
            Bytes::from_static(b"code"),
            None,
        ));
        let array = Artifact::array_of(Arc::clone(&element));
        assert_eq!(array.name().to_string(), "[app.Engine");
        assert!(array.is_array());
        assert!(array.bytes().is_empty());
        assert!(Arc::ptr_eq(array.element().unwrap(), &element));
    }
}
