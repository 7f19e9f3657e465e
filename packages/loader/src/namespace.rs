//! Namespace descriptors and materialized namespaces.

/// Title, version, and vendor for one side of a namespace description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMeta {
    /// Human-readable title.
    pub title: Option<String>,
    /// Version string.
    pub version: Option<String>,
    /// Vendor string.
    pub vendor: Option<String>,
}

impl NamespaceMeta {
    /// Fully populated metadata.
    pub fn new(
        title: impl Into<String>,
        version: impl Into<String>,
        vendor: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            version: Some(version.into()),
            vendor: Some(vendor.into()),
        }
    }
}

/// The description handed to `define`: specification and implementation
/// metadata plus an optional seal origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDescriptor {
    /// The namespace name, e.g. `app.core`.
    pub name: String,
    /// Specification metadata.
    pub spec: NamespaceMeta,
    /// Implementation metadata.
    pub implementation: NamespaceMeta,
    /// When set, the namespace is sealed with respect to this origin.
    pub seal_origin: Option<String>,
}

impl NamespaceDescriptor {
    /// A descriptor with only a name; metadata defaults to empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: NamespaceMeta::default(),
            implementation: NamespaceMeta::default(),
            seal_origin: None,
        }
    }

    /// Set specification metadata.
    pub fn with_spec(mut self, spec: NamespaceMeta) -> Self {
        self.spec = spec;
        self
    }

    /// Set implementation metadata.
    pub fn with_implementation(mut self, implementation: NamespaceMeta) -> Self {
        self.implementation = implementation;
        self
    }

    /// Seal the namespace with respect to an origin.
    pub fn sealed(mut self, origin: impl Into<String>) -> Self {
        self.seal_origin = Some(origin.into());
        self
    }
}

/// A materialized namespace.
///
/// At most one exists per name per loader; concurrent definers observe
/// the same `Arc<Namespace>`.
#[derive(Debug, PartialEq, Eq)]
pub struct Namespace {
    name: String,
    spec: NamespaceMeta,
    implementation: NamespaceMeta,
    seal_origin: Option<String>,
}

impl Namespace {
    pub(crate) fn from_descriptor(descriptor: &NamespaceDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            spec: descriptor.spec.clone(),
            implementation: descriptor.implementation.clone(),
            seal_origin: descriptor.seal_origin.clone(),
        }
    }

    /// The namespace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Specification metadata.
    pub fn spec(&self) -> &NamespaceMeta {
        &self.spec
    }

    /// Implementation metadata.
    pub fn implementation(&self) -> &NamespaceMeta {
        &self.implementation
    }

    /// The seal origin, when sealed.
    pub fn seal_origin(&self) -> Option<&str> {
        self.seal_origin.as_deref()
    }

    /// Whether the namespace is sealed.
    pub fn is_sealed(&self) -> bool {
        self.seal_origin.is_some()
    }
}
