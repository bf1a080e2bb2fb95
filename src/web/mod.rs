//! Web layer
//!
//! Route handlers, form DTOs, per-request session context, and the
//! server-rendered HTML views.

pub mod account;
pub mod context;
pub mod files;
pub mod forms;
pub mod router;
pub mod views;

pub use router::build_router;
