pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod server;
pub mod session;
pub mod storage;
pub mod web;

pub use server::Server;
