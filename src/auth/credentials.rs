//! Credential storage and management
//!
//! SQLite-backed user store. Passwords are stored as bcrypt hashes;
//! username and email uniqueness is enforced by the database so that
//! concurrent registrations cannot both win.

use rusqlite::{Connection, OptionalExtension, params};

use crate::auth::results::UserRecord;
use crate::error::AuthError;

/// Bcrypt work factor for new password hashes
const BCRYPT_COST: u32 = 10;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT UNIQUE NOT NULL,
    email         TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    created_at    TEXT DEFAULT CURRENT_TIMESTAMP
);
";

/// Create the users table if it does not exist yet.
pub fn run_migrations(conn: &Connection) -> Result<(), AuthError> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Insert a new user and return its id.
///
/// The password is hashed here; callers never handle the hash. A taken
/// username or email surfaces as `UsernameTaken` / `EmailTaken`.
pub fn create_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i64, AuthError> {
    let password_hash =
        bcrypt::hash(password, BCRYPT_COST).map_err(|e| AuthError::PasswordHash(e.to_string()))?;

    let result = conn.execute(
        "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
        params![username, email, password_hash],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) => Err(map_unique_violation(e, username, email)),
    }
}

/// Look a user up by username or email, whichever the identifier looks like.
pub fn find_by_identifier(
    conn: &Connection,
    identifier: &str,
) -> Result<Option<UserRecord>, AuthError> {
    if identifier.contains('@') {
        find_by_email(conn, identifier)
    } else {
        find_by_username(conn, identifier)
    }
}

pub fn find_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserRecord>, AuthError> {
    let user = conn
        .query_row(
            "SELECT id, username, email, password_hash FROM users WHERE username = ?1",
            params![username],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<UserRecord>, AuthError> {
    let user = conn
        .query_row(
            "SELECT id, username, email, password_hash FROM users WHERE email = ?1",
            params![email],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// Check an identifier/password pair against the store.
///
/// Unknown identifiers and wrong passwords both come back as
/// `InvalidCredentials`.
pub fn authenticate(
    conn: &Connection,
    identifier: &str,
    password: &str,
) -> Result<UserRecord, AuthError> {
    let user = find_by_identifier(conn, identifier)?.ok_or(AuthError::InvalidCredentials)?;

    let matches = bcrypt::verify(password, &user.password_hash)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

    if matches {
        Ok(user)
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> Result<UserRecord, rusqlite::Error> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
    })
}

fn map_unique_violation(error: rusqlite::Error, username: &str, email: &str) -> AuthError {
    if let rusqlite::Error::SqliteFailure(code, ref message) = error {
        if code.code == rusqlite::ErrorCode::ConstraintViolation {
            let detail = message.as_deref().unwrap_or("");
            if detail.contains("users.email") {
                return AuthError::EmailTaken(email.to_string());
            }
            if detail.contains("users.username") {
                return AuthError::UsernameTaken(username.to_string());
            }
        }
    }
    AuthError::Database(error)
}
