//! Module `session`
//!
//! Defines the `Session` struct: the per-browser state carried between
//! requests. A session exists as soon as a visitor arrives, so flash
//! messages and the CSRF token work before login; identity is attached
//! only after a successful login.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use std::time::{Duration, Instant};

/// Identity attached to a session after login
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Category of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

/// A one-shot notice shown on the next rendered page
#[derive(Debug, Clone)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

/// Represents the state of one browser session.
pub struct Session {
    user: Option<SessionUser>,
    csrf_token: String,
    flash: Vec<Flash>,
    expires_at: Instant,
}

impl Session {
    /// Create an anonymous session that expires after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            user: None,
            csrf_token: generate_csrf_token(),
            flash: Vec::new(),
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Returns whether the session carries a logged-in user.
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Returns the logged-in user, if any.
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Attach an identity after successful login.
    pub fn set_user(&mut self, user: SessionUser) {
        self.user = Some(user);
    }

    /// Returns the CSRF token issued with this session.
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// Check a token presented by a form or query string.
    pub fn csrf_matches(&self, presented: &str) -> bool {
        !presented.is_empty() && presented == self.csrf_token
    }

    /// Queue a notice for the next rendered page.
    pub fn push_flash(&mut self, kind: FlashKind, text: impl Into<String>) {
        self.flash.push(Flash {
            kind,
            text: text.into(),
        });
    }

    /// Drain all queued notices; each is shown exactly once.
    pub fn take_flash(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flash)
    }
}

fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
