//! Path confinement
//!
//! Resolves user-supplied relative paths against a user's root directory.
//! Resolution is purely lexical: `.`, `..`, and redundant separators are
//! folded without touching the filesystem, and anything that would land
//! outside the root is rejected before any I/O happens.

use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// Resolve a client-supplied relative path against the user's root.
///
/// Returns the absolute path on success. Absolute inputs, drive prefixes,
/// and `..` sequences that climb above the root all fail with
/// `AccessDenied`.
pub fn resolve(root: &Path, requested: &str) -> Result<PathBuf, StorageError> {
    if requested.contains('\0') {
        return Err(StorageError::AccessDenied(requested.into()));
    }

    // Treat backslashes as separators so Windows-style traversal
    // attempts are seen by the component walk below.
    let normalized = requested.replace('\\', "/");

    if has_drive_prefix(&normalized) {
        return Err(StorageError::AccessDenied(requested.into()));
    }

    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => {
                parts.push(part.to_string_lossy().into_owned());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root means the request escapes it
                if parts.pop().is_none() {
                    return Err(StorageError::AccessDenied(requested.into()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::AccessDenied(requested.into()));
            }
        }
    }

    let mut resolved = root.to_path_buf();
    for part in &parts {
        resolved.push(part);
    }

    if !is_within_root(&resolved, root) {
        return Err(StorageError::AccessDenied(requested.into()));
    }

    Ok(resolved)
}

/// Check that `path` is the root itself or a descendant of it.
///
/// The comparison is component-wise, so a sibling sharing a name prefix
/// (`/home/user1x` against root `/home/user1`) does not pass.
pub fn is_within_root(path: &Path, root: &Path) -> bool {
    path == root || path.starts_with(root)
}

/// Validate a single new file or folder name (no path separators allowed).
pub fn validate_leaf_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidName("empty name".into()));
    }
    if name == "." || name == ".." {
        return Err(StorageError::InvalidName(name.into()));
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(StorageError::InvalidName(name.into()));
    }
    Ok(())
}

/// Join a relative directory path and an entry name into a relative path
/// using forward slashes.
pub fn join_relative(base: &str, name: &str) -> String {
    let base = base.trim_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Parent of a relative path; the parent of a top-level entry is `""`.
pub fn parent_relative(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, _)) => parent.to_string(),
        None => String::new(),
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
