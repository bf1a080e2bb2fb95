//! Session registry
//!
//! Owns all live sessions behind a mutex, keyed by the opaque token
//! stored in the browser cookie. Expired entries are dropped lazily on
//! access and swept by a periodic prune.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use log::debug;
use uuid::Uuid;

use crate::session::state::Session;

/// Registry for tracking active sessions
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a fresh anonymous session and return its token.
    pub fn create(&self) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.lock();
        sessions.insert(token.clone(), Session::new(self.ttl));
        token
    }

    /// Return a usable session token, reusing the presented one when it
    /// still names a live session.
    pub fn ensure(&self, token: Option<&str>) -> String {
        if let Some(token) = token {
            let mut sessions = self.lock();
            match sessions.get(token) {
                Some(session) if !session.is_expired() => return token.to_string(),
                Some(_) => {
                    sessions.remove(token);
                }
                None => {}
            }
        }
        self.create()
    }

    /// Run `f` against the session for `token`.
    ///
    /// Returns `None` when the token is unknown or expired; an expired
    /// entry is removed on the way out.
    pub fn with<R>(&self, token: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.lock();
        match sessions.get_mut(token) {
            Some(session) if !session.is_expired() => Some(f(session)),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Drop the session for `token`, if any.
    pub fn destroy(&self, token: &str) {
        self.lock().remove(token);
    }

    /// Sweep out expired sessions; returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        let removed = before - sessions.len();
        if removed > 0 {
            debug!("Pruned {} expired session(s)", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
