//! File system storage management
//!
//! Handles path confinement and the per-user file operations.

pub mod guard;
pub mod operations;
pub mod results;
pub mod upload;

// Re-export commonly used types
pub use results::{DownloadFile, EntryInfo};
pub use upload::UploadSink;
