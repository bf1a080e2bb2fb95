//! Error types
//!
//! Defines domain-specific error types for each module of the file manager.

use std::fmt;
use std::io;

/// Authentication and user-store errors
#[derive(Debug)]
pub enum AuthError {
    InvalidCredentials,
    UsernameTaken(String),
    EmailTaken(String),
    NotLoggedIn,
    PasswordHash(String),
    Database(rusqlite::Error),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::UsernameTaken(u) => write!(f, "Username already taken: {}", u),
            AuthError::EmailTaken(e) => write!(f, "Email already registered: {}", e),
            AuthError::NotLoggedIn => write!(f, "User not logged in"),
            AuthError::PasswordHash(msg) => write!(f, "Password hashing failed: {}", msg),
            AuthError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<rusqlite::Error> for AuthError {
    fn from(error: rusqlite::Error) -> Self {
        AuthError::Database(error)
    }
}

/// Form input validation errors
///
/// The payload is the user-facing message flashed back to the form.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {}", self.0)
    }
}

impl std::error::Error for ValidationError {}

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    AccessDenied(String),
    NotFound(String),
    AlreadyExists(String),
    NotADirectory(String),
    InvalidName(String),
    InvalidFileType(String),
    TooLarge(u64),
    Unsupported(String),
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::AccessDenied(p) => write!(f, "Access denied: {}", p),
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::AlreadyExists(p) => write!(f, "Already exists: {}", p),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            StorageError::InvalidName(n) => write!(f, "Invalid name: {}", n),
            StorageError::InvalidFileType(n) => write!(f, "Invalid file type: {}", n),
            StorageError::TooLarge(size) => write!(f, "File too large: {} bytes", size),
            StorageError::Unsupported(p) => write!(f, "Operation not supported: {}", p),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

/// General application error that encompasses all error types
#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Validation(ValidationError),
    Storage(StorageError),
    IoError(io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(e) => write!(f, "Authentication error: {}", e),
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

// Implement conversions from specific errors to AppError
impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        AppError::Auth(error)
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::Validation(error)
    }
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        AppError::Storage(error)
    }
}

impl From<io::Error> for AppError {
    fn from(error: io::Error) -> Self {
        AppError::IoError(error)
    }
}
