//! Sandbox enforcement for the document filesystem server.
//!
//! Every tool resolves its path arguments through [`PathGuard`] before
//! touching the filesystem. A path is accepted only when its canonical form
//! is the sandbox root or lies beneath it.

use crate::error::ToolError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while resolving a requested path.
#[derive(Error, Debug)]
pub enum GuardError {
    /// The path contains a null byte.
    #[error("path contains null byte")]
    NullByte,
    /// The path (or its parent) could not be resolved.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Outcome of checking a path against the sandbox root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Canonical path inside the root.
    Allowed(PathBuf),
    /// Canonical path that escapes the root.
    Denied(PathBuf),
}

/// Single-root path sandbox.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Create a guard for `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, GuardError> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(GuardError::Io(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("sandbox root {} is not a directory", root.display()),
            )));
        }
        Ok(Self { root })
    }

    /// The canonical sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check a requested path against the root.
    ///
    /// Relative paths are taken relative to the root. Paths that do not
    /// exist yet are resolved through their parent directory, which must
    /// exist. The containment test compares path components, so a sibling
    /// like `/data2` is never mistaken for a child of `/data`.
    pub fn check(&self, path: &str) -> Result<Access, GuardError> {
        if path.contains('\0') {
            return Err(GuardError::NullByte);
        }
        self.check_path(Path::new(path))
    }

    /// [`check`](Self::check) for a path that is not necessarily UTF-8,
    /// such as a directory entry returned by the OS.
    pub fn check_path(&self, path: &Path) -> Result<Access, GuardError> {
        let requested = self.root.join(path);
        let canonical = match std::fs::symlink_metadata(&requested) {
            // Dangling symlinks fail here rather than being resolved by name.
            Ok(_) => requested.canonicalize()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => canonical_parent_join(&requested)?,
            Err(e) => return Err(e.into()),
        };
        Ok(self.classify(canonical))
    }

    /// Like [`check`](Self::check), but a symlink in the final component
    /// is not followed: the result names the link itself, located by its
    /// canonical parent directory.
    pub fn check_entry(&self, path: &str) -> Result<Access, GuardError> {
        if path.contains('\0') {
            return Err(GuardError::NullByte);
        }
        let requested = self.root.join(path);
        let is_link = std::fs::symlink_metadata(&requested).is_ok_and(|m| m.is_symlink());
        if !is_link {
            return self.check_path(&requested);
        }
        Ok(self.classify(canonical_parent_join(&requested)?))
    }

    fn classify(&self, canonical: PathBuf) -> Access {
        if canonical.starts_with(&self.root) {
            Access::Allowed(canonical)
        } else {
            Access::Denied(canonical)
        }
    }

    /// Resolve a requested path, turning a denial into [`ToolError::AccessDenied`].
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ToolError> {
        into_allowed(self.check(path)?)
    }

    /// Resolve a requested path without following a final symlink.
    pub fn resolve_entry(&self, path: &str) -> Result<PathBuf, ToolError> {
        into_allowed(self.check_entry(path)?)
    }
}

fn into_allowed(access: Access) -> Result<PathBuf, ToolError> {
    match access {
        Access::Allowed(path) => Ok(path),
        Access::Denied(path) => Err(ToolError::AccessDenied(path)),
    }
}

fn canonical_parent_join(path: &Path) -> io::Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "parent directory not found"))?;
    Ok(parent.canonicalize()?.join(file_name))
}
