//! Download directory containment checks
//!
//! Every path that reaches a client (file retrieval, reveal, status file
//! lists) or enters a task's file list goes through [`FileGuard`]. A path is
//! accepted only when it lies strictly inside the canonical download root,
//! compared component by component, so a sibling such as `downloads-evil`
//! never passes for `downloads`.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Containment rule for a single download root
#[derive(Debug, Clone)]
pub struct FileGuard {
    root: PathBuf,
}

impl FileGuard {
    /// Create the root directory if needed and canonicalize it
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create download directory '{}': {}",
                    root.display(),
                    e
                ),
            ))
        })?;
        let root = std::fs::canonicalize(root)?;
        Ok(Self { root })
    }

    /// Canonical download root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `candidate` resolves to a path strictly inside the root
    ///
    /// Relative candidates are taken relative to the working directory.
    /// Existing paths are canonicalized, so a symlink pointing out of the
    /// root is rejected.
    pub fn contains(&self, candidate: &Path) -> bool {
        let Ok(absolute) = std::path::absolute(candidate) else {
            return false;
        };
        self.is_inside(&resolve_existing(normalize(&absolute)))
    }

    /// Resolve a client-supplied path relative to the root
    ///
    /// Fails with [`Error::ForbiddenPath`] when the result escapes the root
    /// (including the root itself). The error carries `relative` as given so
    /// the root's location is never reported back. The returned path may not
    /// exist.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let resolved = resolve_existing(normalize(&self.root.join(relative)));
        if self.is_inside(&resolved) {
            Ok(resolved)
        } else {
            Err(Error::ForbiddenPath {
                path: PathBuf::from(relative),
            })
        }
    }

    /// Resolve a client-supplied path that must name an existing regular file
    pub fn existing_file(&self, relative: &str) -> Result<PathBuf> {
        let path = self.resolve(relative)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::NotFound(relative.to_string()))
        }
    }

    /// Keep only the basenames that currently exist inside the root
    pub fn filter_existing(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|name| {
                self.resolve(name)
                    .map(|path| path.exists())
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn is_inside(&self, path: &Path) -> bool {
        path != self.root && path.starts_with(&self.root)
    }
}

/// Canonicalize when the path exists, otherwise keep the lexical form
fn resolve_existing(path: PathBuf) -> PathBuf {
    std::fs::canonicalize(&path).unwrap_or(path)
}

/// Remove `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
