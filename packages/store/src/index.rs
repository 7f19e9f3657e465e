//! Persisted path index for directory-backed stores.
//!
//! The index is a sidecar file next to the store root (`<root>.index`),
//! one relative path per line, with the empty-string root entry first.
//! A present, readable sidecar is trusted verbatim - there is no
//! freshness check against current store contents. Persist failures are
//! best-effort only: the partial file is removed and the computed list
//! is still returned to the caller.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Sidecar location for a store root: the root path with `.index`
/// appended, a sibling of the root directory.
pub(crate) fn sidecar_path(root: &Path) -> PathBuf {
    let mut os = root.as_os_str().to_os_string();
    os.push(".index");
    PathBuf::from(os)
}

/// Read a persisted index, if one is present and fully readable.
///
/// Returns `None` when the sidecar is absent or a read fails partway
/// through; the caller falls back to a fresh walk either way.
pub(crate) fn read(sidecar: &Path) -> Option<Vec<String>> {
    let file = fs::File::open(sidecar).ok()?;
    let mut paths = Vec::new();
    for line in BufReader::new(file).lines() {
        match line {
            Ok(line) => paths.push(line.trim().to_string()),
            Err(e) => {
                debug!(sidecar = %sidecar.display(), error = %e, "discarding partially read index");
                return None;
            }
        }
    }
    Some(paths)
}

/// Walk the store root once, collecting directory paths only.
///
/// The root itself is recorded as `""` and comes first; deeper
/// directories follow in depth-first discovery order. Unreadable
/// subtrees are skipped rather than failing the whole enumeration.
pub(crate) fn build(root: &Path) -> Vec<String> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(root = %root.display(), error = %e, "skipping unreadable entry during index build");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let joined = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        paths.push(joined);
    }
    paths
}

/// Atomically persist the computed index to its sidecar, best-effort.
///
/// Writes to a temporary sibling and renames into place so readers only
/// ever observe a complete file. Any failure is swallowed after removing
/// the partial temporary.
pub(crate) fn persist(sidecar: &Path, paths: &[String]) {
    let tmp = {
        let mut os = sidecar.as_os_str().to_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    };
    if let Err(e) = write_all(&tmp, paths).and_then(|()| fs::rename(&tmp, sidecar)) {
        debug!(sidecar = %sidecar.display(), error = %e, "index persist failed");
        let _ = fs::remove_file(&tmp);
        let _ = fs::remove_file(sidecar);
    }
}

fn write_all(path: &Path, paths: &[String]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    for name in paths {
        file.write_all(name.as_bytes())?;
        file.write_all(b"\n")?;
    }
    file.flush()
}
