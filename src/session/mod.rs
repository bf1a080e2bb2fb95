//! Session management
//!
//! Server-side sessions keyed by an opaque cookie token.

pub mod registry;
pub mod state;

pub use registry::SessionRegistry;
pub use state::{Flash, FlashKind, Session, SessionUser};

/// Name of the browser cookie carrying the session token
pub const SESSION_COOKIE: &str = "fileshelf_sid";
