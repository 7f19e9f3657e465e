//! Store key validation.
//!
//! Keys are relative `/`-joined paths into the store. Validation happens
//! before any I/O so a hostile or malformed key can never escape the
//! store root.

use std::path::PathBuf;

use crate::StoreError;

/// Validate a store key and split it into its components.
///
/// Rejected keys: empty, absolute, containing empty / `.` / `..`
/// components, backslashes, or NUL bytes.
pub(crate) fn split_key(key: &str) -> Result<Vec<&str>, StoreError> {
    if key.is_empty() {
        return Err(StoreError::invalid_key(key, "empty key"));
    }
    if key.starts_with('/') {
        return Err(StoreError::invalid_key(key, "key must be relative"));
    }
    if key.contains('\\') || key.contains('\0') {
        return Err(StoreError::invalid_key(key, "illegal character in key"));
    }
    let components: Vec<&str> = key.split('/').collect();
    for component in &components {
        match *component {
            "" => return Err(StoreError::invalid_key(key, "empty component")),
            "." | ".." => {
                return Err(StoreError::invalid_key(key, "dot components not allowed"))
            }
            _ => {}
        }
    }
    Ok(components)
}

/// Resolve a validated key against a store root.
pub(crate) fn resolve(root: &std::path::Path, key: &str) -> Result<PathBuf, StoreError> {
    let components = split_key(key)?;
    let mut path = root.to_path_buf();
    for component in components {
        path.push(component);
    }
    Ok(path)
}
