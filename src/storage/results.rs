//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::path::PathBuf;

/// A single entry in a directory listing
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub name: String,
    pub is_directory: bool,
    /// Byte size; directories report 0
    pub size: u64,
    /// Last modification date as YYYY-MM-DD
    pub last_modified: String,
    /// Path relative to the user's root, forward-slash separated
    pub rel_path: String,
}

/// Resolved target of a download request
#[derive(Debug, Clone)]
pub struct DownloadFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}
