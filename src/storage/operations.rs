//! Storage operations
//!
//! Handles filesystem operations behind the web routes: list, create
//! folder, download resolution, delete, and rename. Every entry point
//! resolves its path through the guard before touching the disk.

use chrono::{DateTime, Utc};
use log::{error, info};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, SystemTime};

use crate::error::StorageError;
use crate::storage::guard;
use crate::storage::results::{DownloadFile, EntryInfo};

/// Lists one level of a directory inside the user's root.
///
/// Entries come back sorted: directories first, then byte-wise name order.
pub fn list_directory(user_root: &Path, rel_path: &str) -> Result<Vec<EntryInfo>, StorageError> {
    let real_path = guard::resolve(user_root, rel_path)?;

    if !real_path.exists() {
        return Err(StorageError::NotFound(rel_path.into()));
    }
    if !real_path.is_dir() {
        return Err(StorageError::NotADirectory(rel_path.into()));
    }

    // Read directory contents with retries
    let retries = 3;
    let mut listing = None;

    for attempt in 1..=retries {
        match fs::read_dir(&real_path) {
            Ok(entries) => {
                let mut items = vec![];

                for entry in entries.flatten() {
                    let name = entry.file_name().to_string_lossy().to_string();

                    match entry.metadata() {
                        Ok(metadata) => {
                            let is_directory = metadata.is_dir();
                            let size = if is_directory { 0 } else { metadata.len() };
                            let last_modified = metadata
                                .modified()
                                .map(format_modified)
                                .unwrap_or_default();

                            items.push(EntryInfo {
                                rel_path: guard::join_relative(rel_path, &name),
                                name,
                                is_directory,
                                size,
                                last_modified,
                            });
                        }
                        Err(_) => {
                            // Metadata failures degrade to a bare entry
                            items.push(EntryInfo {
                                rel_path: guard::join_relative(rel_path, &name),
                                name,
                                is_directory: false,
                                size: 0,
                                last_modified: String::new(),
                            });
                        }
                    }
                }

                sort_entries(&mut items);
                listing = Some(items);
                break;
            }
            Err(e) => {
                if attempt < retries && e.kind() == std::io::ErrorKind::PermissionDenied {
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                    continue;
                } else {
                    error!(
                        "Failed to list directory '{}' (real: {}): {}",
                        rel_path,
                        real_path.display(),
                        e
                    );
                    return Err(StorageError::from(e));
                }
            }
        }
    }

    let entries = listing.ok_or_else(|| {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            "Failed to read directory after retries",
        ))
    })?;

    info!(
        "Listed directory '{}' (real: {}) - {} entries",
        rel_path,
        real_path.display(),
        entries.len()
    );

    Ok(entries)
}

/// Creates a new folder inside an existing directory.
///
/// Returns the relative path of the new folder. The parent must already
/// exist; creation is never recursive.
pub fn create_folder(
    user_root: &Path,
    parent_rel: &str,
    folder_name: &str,
) -> Result<String, StorageError> {
    guard::validate_leaf_name(folder_name)?;

    let new_rel = guard::join_relative(parent_rel, folder_name);
    let new_path = guard::resolve(user_root, &new_rel)?;

    if new_path.exists() {
        return Err(StorageError::AlreadyExists(new_rel));
    }

    // Parent must exist; mkdir here is deliberately non-recursive
    match new_path.parent() {
        Some(parent) if parent.exists() => {}
        _ => return Err(StorageError::NotFound(parent_rel.into())),
    }

    fs::create_dir(&new_path).map_err(|e| {
        error!(
            "Failed to create folder '{}' (real: {}): {}",
            new_rel,
            new_path.display(),
            e
        );
        StorageError::from(e)
    })?;

    info!("Created folder '{}' (real: {})", new_rel, new_path.display());

    Ok(new_rel)
}

/// Resolves a download request to a concrete file.
///
/// Directories are refused; archive downloads are not supported.
pub fn prepare_download(user_root: &Path, rel_path: &str) -> Result<DownloadFile, StorageError> {
    let real_path = guard::resolve(user_root, rel_path)?;

    let metadata = match fs::metadata(&real_path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound(rel_path.into()));
        }
        Err(e) => return Err(StorageError::from(e)),
    };

    if metadata.is_dir() {
        return Err(StorageError::Unsupported(rel_path.into()));
    }

    let file_name = real_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| rel_path.to_string());

    info!(
        "Prepared download of '{}' (real: {}, {} bytes)",
        rel_path,
        real_path.display(),
        metadata.len()
    );

    Ok(DownloadFile {
        path: real_path,
        file_name,
        size: metadata.len(),
    })
}

/// Deletes a file or recursively deletes a directory.
pub fn delete_entry(user_root: &Path, rel_path: &str) -> Result<(), StorageError> {
    let real_path = guard::resolve(user_root, rel_path)?;

    // The user's root itself stays
    if real_path == user_root {
        return Err(StorageError::AccessDenied(rel_path.into()));
    }

    let metadata = match fs::metadata(&real_path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound(rel_path.into()));
        }
        Err(e) => return Err(StorageError::from(e)),
    };

    // Delete with retries for permission issues
    let retries = 3;
    for attempt in 1..=retries {
        let result = if metadata.is_dir() {
            fs::remove_dir_all(&real_path)
        } else {
            fs::remove_file(&real_path)
        };

        match result {
            Ok(_) => {
                info!("Deleted '{}' (real: {})", rel_path, real_path.display());
                return Ok(());
            }
            Err(e) => {
                if attempt < retries && e.kind() == std::io::ErrorKind::PermissionDenied {
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                    continue;
                } else {
                    error!(
                        "Failed to delete '{}' (real: {}): {}",
                        rel_path,
                        real_path.display(),
                        e
                    );
                    return Err(StorageError::from(e));
                }
            }
        }
    }

    Err(StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Failed to delete entry after retries",
    )))
}

/// Renames an entry in place; the new name stays in the same directory.
///
/// Returns the relative path of the renamed entry. An occupied
/// destination is an error rather than an overwrite.
pub fn rename_entry(
    user_root: &Path,
    old_rel: &str,
    new_name: &str,
) -> Result<String, StorageError> {
    guard::validate_leaf_name(new_name)?;

    let old_path = guard::resolve(user_root, old_rel)?;
    if old_path == user_root {
        return Err(StorageError::AccessDenied(old_rel.into()));
    }
    if !old_path.exists() {
        return Err(StorageError::NotFound(old_rel.into()));
    }

    let new_rel = guard::join_relative(&guard::parent_relative(old_rel), new_name);
    let new_path = guard::resolve(user_root, &new_rel)?;

    if new_path.exists() {
        return Err(StorageError::AlreadyExists(new_rel));
    }

    fs::rename(&old_path, &new_path).map_err(|e| {
        error!(
            "Failed to rename '{}' to '{}': {}",
            old_rel, new_name, e
        );
        StorageError::from(e)
    })?;

    info!("Renamed '{}' to '{}'", old_rel, new_rel);

    Ok(new_rel)
}

/// Sort directories before files, names in byte-wise lexicographic order.
pub fn sort_entries(entries: &mut [EntryInfo]) {
    entries.sort_by(|a, b| match (a.is_directory, b.is_directory) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
}

fn format_modified(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format("%Y-%m-%d").to_string()
}
