//! Registration and login input validation
//!
//! Checks form input before it reaches the credential store. Error
//! payloads carry the message flashed back to the form, so the first
//! failing rule decides what the user sees.

use crate::error::ValidationError;

const MAX_INPUT_LENGTH: usize = 255;
const MIN_PASSWORD_LENGTH: usize = 6;

/// Performs basic input sanitation to check for malicious or malformed values.
fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.trim().is_empty() && input.len() <= max_length && !input.contains(['\r', '\n', '\0'])
}

/// Validate a registration form. Rules are checked in order; the first
/// failure wins.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), ValidationError> {
    if !is_valid_input(username, MAX_INPUT_LENGTH) {
        return Err(ValidationError("Username is required".into()));
    }

    if !is_valid_email(email) {
        return Err(ValidationError("Please enter a valid email".into()));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError(
            "Password must be at least 6 characters".into(),
        ));
    }

    Ok(())
}

/// Validate a login form. Empty or malformed fields fail with the same
/// message as a wrong password so the form leaks nothing.
pub fn validate_login(identifier: &str, password: &str) -> Result<(), ValidationError> {
    if !is_valid_input(identifier, MAX_INPUT_LENGTH) || password.is_empty() {
        return Err(ValidationError("Invalid credentials".into()));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if !is_valid_input(email, MAX_INPUT_LENGTH) || email.contains(' ') {
        return false;
    }

    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    }
}
