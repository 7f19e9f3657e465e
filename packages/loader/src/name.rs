//! Artifact names: validated dotted identifiers with an array tag.

use std::fmt;

use thiserror::Error;

/// Errors related to artifact name parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// The name string is empty.
    #[error("artifact name is empty")]
    Empty,

    /// A name component is not a valid Unicode identifier.
    #[error("invalid name component '{component}' at position {position}: {message}")]
    InvalidComponent {
        /// The offending component.
        component: String,
        /// Zero-based position of the component.
        position: usize,
        /// Why the component was rejected.
        message: String,
    },

    /// An array tag with nothing after it.
    #[error("array tag without an element name")]
    BareArrayTag,
}

/// A validated artifact name.
///
/// Scalar names are `.`-separated Unicode identifier components
/// (per UAX#31), e.g. `app.core.Engine`. Array names wrap an element
/// name and are written with a leading `[` per level: `[app.core.Engine`
/// is an array of `app.core.Engine`. Array names are synthesized from a
/// visible element artifact rather than looked up in a store.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum ArtifactName {
    /// A plain dotted name.
    Scalar(String),
    /// An array of the element name.
    Array(Box<ArtifactName>),
}

impl ArtifactName {
    /// Parse a name string, validating components.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use modweave_loader::ArtifactName;
    ///
    /// let name = ArtifactName::parse("app.core.Engine").unwrap();
    /// assert_eq!(name.namespace(), Some("app.core"));
    /// assert_eq!(name.local_name(), Some("Engine"));
    ///
    /// let array = ArtifactName::parse("[app.core.Engine").unwrap();
    /// assert!(array.is_array());
    /// ```
    pub fn parse(s: &str) -> Result<Self, NameError> {
        if s.is_empty() {
            return Err(NameError::Empty);
        }
        if let Some(rest) = s.strip_prefix('[') {
            if rest.is_empty() {
                return Err(NameError::BareArrayTag);
            }
            return Ok(ArtifactName::Array(Box::new(Self::parse(rest)?)));
        }
        for (i, component) in s.split('.').enumerate() {
            Self::validate_component(component, i)?;
        }
        Ok(ArtifactName::Scalar(s.to_string()))
    }

    /// Create a scalar name from a pre-validated string.
    pub fn scalar(s: &str) -> Result<Self, NameError> {
        match Self::parse(s)? {
            name @ ArtifactName::Scalar(_) => Ok(name),
            ArtifactName::Array(_) => Err(NameError::InvalidComponent {
                component: s.to_string(),
                position: 0,
                message: "array tag not allowed here".to_string(),
            }),
        }
    }

    /// Wrap an element name into its array name.
    pub fn array_of(element: ArtifactName) -> Self {
        ArtifactName::Array(Box::new(element))
    }

    /// Whether this is an array name.
    pub fn is_array(&self) -> bool {
        matches!(self, ArtifactName::Array(_))
    }

    /// The element name of an array name.
    pub fn element(&self) -> Option<&ArtifactName> {
        match self {
            ArtifactName::Array(element) => Some(element),
            ArtifactName::Scalar(_) => None,
        }
    }

    /// The namespace prefix of a scalar name: everything before the last
    /// `.`, or `None` for single-component and array names.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            ArtifactName::Scalar(s) => s.rsplit_once('.').map(|(ns, _)| ns),
            ArtifactName::Array(_) => None,
        }
    }

    /// The local name of a scalar name: everything after the last `.`.
    pub fn local_name(&self) -> Option<&str> {
        match self {
            ArtifactName::Scalar(s) => Some(s.rsplit_once('.').map_or(s.as_str(), |(_, l)| l)),
            ArtifactName::Array(_) => None,
        }
    }

    /// The store key holding this name's definition bytes: components
    /// joined with `/` plus the `.def` suffix. Array names have no
    /// stored definition.
    pub fn definition_path(&self) -> Option<String> {
        match self {
            ArtifactName::Scalar(s) => Some(format!("{}.def", s.replace('.', "/"))),
            ArtifactName::Array(_) => None,
        }
    }

    fn validate_component(component: &str, position: usize) -> Result<(), NameError> {
        let reject = |message: &str| NameError::InvalidComponent {
            component: component.to_string(),
            position,
            message: message.to_string(),
        };
        let mut chars = component.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return Err(reject("empty component")),
        };
        if !unicode_ident::is_xid_start(first) && first != '_' {
            return Err(reject("must start with a letter or underscore"));
        }
        for c in chars {
            if !unicode_ident::is_xid_continue(c) {
                return Err(reject("invalid character in identifier"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactName::Scalar(s) => f.write_str(s),
            ArtifactName::Array(element) => write!(f, "[{}", element),
        }
    }
}

/// Build an [`ArtifactName`] from a literal, panicking on invalid input.
///
/// # Example
///
/// ```rust
/// use modweave_loader::name;
///
/// let n = name!("app.core.Engine");
/// assert_eq!(n.local_name(), Some("Engine"));
/// ```
#[macro_export]
macro_rules! name {
    ($s:expr) => {
        $crate::ArtifactName::parse($s).expect("invalid artifact name literal")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scalar_names() {
        assert!(ArtifactName::parse("Engine").unwrap().namespace().is_none());
        let n = ArtifactName::parse("app.core.Engine").unwrap();
        assert_eq!(n.namespace(), Some("app.core"));
        assert_eq!(n.local_name(), Some("Engine"));
        assert_eq!(n.definition_path(), Some("app/core/Engine.def".to_string()));
    }

    #[test]
    fn empty_name_rejected() {
        assert_eq!(ArtifactName::parse(""), Err(NameError::Empty));
    }

    #[test]
    fn bad_components_rejected() {
        assert!(ArtifactName::parse("app..Engine").is_err());
        assert!(ArtifactName::parse("app.1core").is_err());
        assert!(ArtifactName::parse("app.co re").is_err());
        assert!(ArtifactName::parse(".app").is_err());
        assert!(ArtifactName::parse("app.").is_err());
    }

    #[test]
    fn underscore_start_allowed() {
        assert!(ArtifactName::parse("_internal.Engine").is_ok());
    }

    #[test]
    fn array_names_nest() {
        let n = ArtifactName::parse("[app.Engine").unwrap();
        assert!(n.is_array());
        assert_eq!(n.element(), Some(&ArtifactName::parse("app.Engine").unwrap()));
        assert!(n.definition_path().is_none());

        let nested = ArtifactName::parse("[[app.Engine").unwrap();
        assert!(nested.element().unwrap().is_array());
    }

    #[test]
    fn bare_array_tag_rejected() {
        assert_eq!(ArtifactName::parse("["), Err(NameError::BareArrayTag));
    }

    #[test]
    fn display_roundtrips() {
        for s in ["Engine", "app.core.Engine", "[app.Engine", "[[app.Engine"] {
            assert_eq!(ArtifactName::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn scalar_rejects_array_tag() {
        assert!(ArtifactName::scalar("[app.Engine").is_err());
        assert!(ArtifactName::scalar("app.Engine").is_ok());
    }
}
