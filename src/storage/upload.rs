//! Upload sink
//!
//! Streams an upload into a temporary file inside the target directory,
//! then atomically renames it over the final name. A rejected or failed
//! upload never leaves a partial file behind; an accepted upload replaces
//! any existing file with the same name.

use log::{error, info};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::StorageError;
use crate::storage::guard;

/// File extensions accepted for upload
const ALLOWED_EXTENSIONS: [&str; 11] = [
    "jpeg", "jpg", "png", "gif", "doc", "docx", "pdf", "txt", "csv", "zip", "rar",
];

/// Check a filename against the upload allow-list.
///
/// Files without an extension are rejected.
pub fn allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// In-progress upload writing to a temporary file.
pub struct UploadSink {
    final_path: PathBuf,
    temp_path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
}

impl UploadSink {
    /// Validate the upload target and open a temporary file for it.
    ///
    /// The filename is checked against the allow-list before anything is
    /// written; the target directory must already exist inside the user's
    /// root (the root itself is created on demand).
    pub async fn create(
        user_root: &Path,
        rel_dir: &str,
        filename: &str,
        max_bytes: u64,
    ) -> Result<Self, StorageError> {
        guard::validate_leaf_name(filename)?;

        if !allowed_extension(filename) {
            return Err(StorageError::InvalidFileType(filename.into()));
        }

        if !user_root.exists() {
            fs::create_dir_all(user_root).await?;
        }

        let target_dir = guard::resolve(user_root, rel_dir)?;
        if !target_dir.exists() {
            return Err(StorageError::NotFound(rel_dir.into()));
        }
        if !target_dir.is_dir() {
            return Err(StorageError::NotADirectory(rel_dir.into()));
        }

        let final_path = target_dir.join(filename);
        let temp_path = target_dir.join(format!(".{}.part", Uuid::new_v4()));

        let file = File::create(&temp_path).await.map_err(|e| {
            error!("Failed to create temporary file {}: {e}", temp_path.display());
            StorageError::from(e)
        })?;

        info!(
            "Starting upload of '{filename}' -> {} (limit {max_bytes} bytes)",
            final_path.display()
        );

        Ok(Self {
            final_path,
            temp_path,
            file,
            written: 0,
            max_bytes,
        })
    }

    /// Append a chunk to the temporary file.
    ///
    /// The size limit is checked before the chunk is written; a failure
    /// removes the temporary file.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let incoming = self.written + chunk.len() as u64;
        if incoming > self.max_bytes {
            error!(
                "Upload size limit exceeded: {incoming} bytes > {} bytes",
                self.max_bytes
            );
            let _ = fs::remove_file(&self.temp_path).await;
            return Err(StorageError::TooLarge(incoming));
        }

        if let Err(e) = self.file.write_all(chunk).await {
            error!(
                "Failed to write to temporary file {}: {e}",
                self.temp_path.display()
            );
            let _ = fs::remove_file(&self.temp_path).await;
            return Err(StorageError::from(e));
        }

        self.written = incoming;
        Ok(())
    }

    /// Total bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush and atomically move the temporary file to its final name.
    pub async fn finish(self) -> Result<PathBuf, StorageError> {
        let UploadSink {
            final_path,
            temp_path,
            mut file,
            written,
            ..
        } = self;

        if let Err(e) = file.flush().await {
            error!("Failed to flush temporary file {}: {e}", temp_path.display());
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::from(e));
        }

        // Close the handle before the rename
        drop(file);

        match fs::rename(&temp_path, &final_path).await {
            Ok(_) => {
                info!(
                    "Upload completed: {} ({written} bytes)",
                    final_path.display()
                );
                Ok(final_path)
            }
            Err(e) => {
                error!(
                    "Failed to rename {} to {}: {e}",
                    temp_path.display(),
                    final_path.display()
                );
                let _ = fs::remove_file(&temp_path).await;
                Err(StorageError::from(e))
            }
        }
    }

    /// Abandon the upload and remove the temporary file.
    pub async fn abort(self) {
        let _ = fs::remove_file(&self.temp_path).await;
    }
}
