//! Authentication system
//!
//! Handles user accounts, credential checks, and registration input rules.

pub mod credentials;
pub mod results;
pub mod validator;

pub use results::UserRecord;
pub use validator::{validate_login, validate_registration};
