//! Server core functionality
//!
//! Startup wiring, the listener, and the state shared by every
//! request handler.

pub mod core;
pub mod state;

pub use core::Server;
pub use state::AppState;
