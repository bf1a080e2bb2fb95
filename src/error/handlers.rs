//! Error handlers
//!
//! Provides error logging and HTTP status mapping.

use crate::error::types::{AppError, StorageError};
use axum::http::StatusCode;
use log::error;

/// Log an application error
pub fn handle_error(err: &AppError) {
    error!("Application error: {}", err);
}

/// Convert error to HTTP status code for the error page
pub fn error_to_status(err: &AppError) -> StatusCode {
    match err {
        AppError::Auth(_) => StatusCode::UNAUTHORIZED,
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Storage(e) => storage_status(e),
        AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn storage_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::AccessDenied(_) => StatusCode::FORBIDDEN,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::AlreadyExists(_) => StatusCode::CONFLICT,
        StorageError::NotADirectory(_) => StatusCode::BAD_REQUEST,
        StorageError::InvalidName(_) => StatusCode::BAD_REQUEST,
        StorageError::InvalidFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        StorageError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        StorageError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        StorageError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
