//! Resource entries: named content with a lazy accessor.
//!
//! A `Resource` is materialized per lookup and never cached by identity;
//! its content is not read until [`Resource::bytes`] or
//! [`Resource::open`] is called.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use bytes::Bytes;

use crate::StoreError;

#[derive(Debug, Clone)]
enum Content {
    File(PathBuf),
    Memory(Bytes),
}

/// A named resource entry with deferred content access.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    locator: String,
    content: Content,
}

impl Resource {
    /// A resource backed by a file on disk.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            locator: format!("file:{}", path.display()),
            content: Content::File(path),
        }
    }

    /// A resource backed by in-memory bytes.
    pub fn memory(name: impl Into<String>, locator: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
            content: Content::Memory(bytes),
        }
    }

    /// The resource name as looked up.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A display locator for the resource content.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Read the full resource content.
    pub fn bytes(&self) -> Result<Bytes, StoreError> {
        match &self.content {
            Content::File(path) => fs::read(path)
                .map(Bytes::from)
                .map_err(|e| StoreError::io(path.clone(), e)),
            Content::Memory(bytes) => Ok(bytes.clone()),
        }
    }

    /// Open the resource content as a reader.
    pub fn open(&self) -> Result<Box<dyn Read + Send>, StoreError> {
        match &self.content {
            Content::File(path) => {
                let file = fs::File::open(path).map_err(|e| StoreError::io(path.clone(), e))?;
                Ok(Box::new(file))
            }
            Content::Memory(bytes) => Ok(Box::new(std::io::Cursor::new(bytes.clone()))),
        }
    }

    /// Content size in bytes.
    pub fn size(&self) -> Result<u64, StoreError> {
        match &self.content {
            Content::File(path) => fs::metadata(path)
                .map(|m| m.len())
                .map_err(|e| StoreError::io(path.clone(), e)),
            Content::Memory(bytes) => Ok(bytes.len() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn memory_resource_roundtrip() {
        let r = Resource::memory("cfg/app.toml", "mem:cfg/app.toml", Bytes::from_static(b"x=1"));
        assert_eq!(r.name(), "cfg/app.toml");
        assert_eq!(r.bytes().unwrap().as_ref(), b"x=1");
        assert_eq!(r.size().unwrap(), 3);

        let mut buf = String::new();
        r.open().unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "x=1");
    }

    #[test]
    fn file_resource_reads_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        fs::File::create(&path)
            .unwrap()
            .write_all(b"hello")
            .unwrap();

        let r = Resource::file("data.txt", &path);
        assert!(r.locator().starts_with("file:"));
        assert_eq!(r.bytes().unwrap().as_ref(), b"hello");
        assert_eq!(r.size().unwrap(), 5);

        // Content is read at access time: removing the file breaks reads
        // of an already-materialized entry.
        fs::remove_file(&path).unwrap();
        assert!(matches!(r.bytes(), Err(StoreError::Io { .. })));
    }
}
