//! Shared application state
//!
//! One instance is built at startup and handed to every request
//! handler behind an `Arc`. The SQLite connection and the rate
//! limiters sit behind mutexes; the session registry locks internally.

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::config::AppConfig;
use crate::middleware::RateLimiter;
use crate::session::SessionRegistry;

pub struct AppState {
    pub config: AppConfig,
    pub sessions: SessionRegistry,
    db: Mutex<Connection>,
    general_limiter: Mutex<RateLimiter>,
    auth_limiter: Mutex<RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig, db: Connection) -> Self {
        let window = config.rate_limit_window();
        let sessions = SessionRegistry::new(config.session_ttl());
        let general_limiter = Mutex::new(RateLimiter::new(config.rate_limit_general_max, window));
        let auth_limiter = Mutex::new(RateLimiter::new(config.rate_limit_auth_max, window));

        AppState {
            config,
            sessions,
            db: Mutex::new(db),
            general_limiter,
            auth_limiter,
        }
    }

    /// Locks the database connection for one query or transaction.
    pub fn db(&self) -> MutexGuard<'_, Connection> {
        self.db
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Limiter applied to every request.
    pub fn general_limiter(&self) -> MutexGuard<'_, RateLimiter> {
        self.general_limiter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stricter limiter applied to the login and register routes.
    pub fn auth_limiter(&self) -> MutexGuard<'_, RateLimiter> {
        self.auth_limiter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Root directory holding the given user's files.
    pub fn user_root(&self, user_id: i64) -> PathBuf {
        self.config.user_files_path().join(user_id.to_string())
    }
}
