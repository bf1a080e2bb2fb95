//! Configuration management for the file manager
//!
//! All values are loaded once at startup from built-in defaults, an optional
//! config.toml, and FILESHELF-prefixed environment overrides.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// IP address to bind the HTTP listener
    pub bind_address: String,

    /// Port for the HTTP listener
    pub port: u16,

    /// SQLite database file holding the users table
    pub database_path: String,

    /// Root directory under which each user's file tree lives
    pub user_files_dir: String,

    /// Session lifetime in seconds
    pub session_ttl_secs: u64,

    /// Maximum upload size in MB
    pub max_upload_size_mb: u64,

    /// Sliding window for rate limiting, in seconds
    pub rate_limit_window_secs: u64,

    /// Requests allowed per window on any route
    pub rate_limit_general_max: usize,

    /// Requests allowed per window on /login and /register
    pub rate_limit_auth_max: usize,
}

impl AppConfig {
    /// Load configuration from defaults, optional config.toml, and
    /// environment overrides (FILESHELF_PORT, FILESHELF_USER_FILES_DIR, ...)
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", "127.0.0.1")?
            .set_default("port", 3000)?
            .set_default("database_path", "fileshelf.db")?
            .set_default("user_files_dir", "user_files")?
            .set_default("session_ttl_secs", 60 * 60 * 24)?
            .set_default("max_upload_size_mb", 20)?
            .set_default("rate_limit_window_secs", 15 * 60)?
            .set_default("rate_limit_general_max", 500)?
            .set_default("rate_limit_auth_max", 10)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("FILESHELF").separator("__"))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("Port cannot be 0".into()));
        }

        if self.user_files_dir.is_empty() {
            return Err(config::ConfigError::Message(
                "user_files_dir cannot be empty".into(),
            ));
        }

        if self.database_path.is_empty() {
            return Err(config::ConfigError::Message(
                "database_path cannot be empty".into(),
            ));
        }

        if self.session_ttl_secs == 0 {
            return Err(config::ConfigError::Message(
                "session_ttl_secs must be greater than 0".into(),
            ));
        }

        if self.max_upload_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if self.rate_limit_window_secs == 0 {
            return Err(config::ConfigError::Message(
                "rate_limit_window_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as socket address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get the user files root as PathBuf
    pub fn user_files_path(&self) -> PathBuf {
        PathBuf::from(&self.user_files_dir)
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }

    /// Get session lifetime as Duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Get rate limit window as Duration
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            database_path: "fileshelf.db".to_string(),
            user_files_dir: "user_files".to_string(),
            session_ttl_secs: 60 * 60 * 24,
            max_upload_size_mb: 20,
            rate_limit_window_secs: 15 * 60,
            rate_limit_general_max: 500,
            rate_limit_auth_max: 10,
        }
    }
}
