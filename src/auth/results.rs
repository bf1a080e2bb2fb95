//! Authentication result types
//!
//! Defines structures returned by the user store.

/// A row from the users table
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
