//! Rate limiting middleware
//!
//! Sliding-window limiter keyed by client IP. Two tiers are applied:
//! a lenient one for every route and a strict one for the login and
//! registration endpoints.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::warn;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::server::state::AppState;

const GENERAL_LIMIT_MESSAGE: &str = "Too many requests, please try again later";
const AUTH_LIMIT_MESSAGE: &str = "Too many authentication attempts, please try again later";

/// Simple sliding-window rate limiter
pub struct RateLimiter {
    requests: HashMap<String, Vec<Instant>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: HashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn is_allowed(&mut self, client_id: &str) -> bool {
        let now = Instant::now();
        let entry = self
            .requests
            .entry(client_id.to_string())
            .or_insert_with(Vec::new);

        // Remove old requests
        entry.retain(|&time| now.duration_since(time) <= self.window);

        // Check if under limit
        if entry.len() < self.max_requests {
            entry.push(now);
            true
        } else {
            false
        }
    }
}

/// Apply the per-IP limits before a request reaches its handler.
///
/// `/login` and `/register` share the strict authentication tier; every
/// route counts against the general tier.
pub async fn limit_requests(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = addr.ip().to_string();
    let path = request.uri().path();

    let is_auth_route = path == "/login" || path == "/register";

    if is_auth_route {
        let allowed = {
            let mut limiter = state.auth_limiter();
            limiter.is_allowed(&client_ip)
        };
        if !allowed {
            warn!("Rate limit (auth) exceeded for {}", client_ip);
            return (StatusCode::TOO_MANY_REQUESTS, AUTH_LIMIT_MESSAGE).into_response();
        }
    }

    let allowed = {
        let mut limiter = state.general_limiter();
        limiter.is_allowed(&client_ip)
    };
    if !allowed {
        warn!("Rate limit exceeded for {}", client_ip);
        return (StatusCode::TOO_MANY_REQUESTS, GENERAL_LIMIT_MESSAGE).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_the_cap_then_rejects() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(!limiter.is_allowed("10.0.0.1"));
    }

    #[test]
    fn clients_are_tracked_independently() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(limiter.is_allowed("10.0.0.2"));
        assert!(!limiter.is_allowed("10.0.0.1"));
    }

    #[test]
    fn window_expiry_frees_capacity() {
        let mut limiter = RateLimiter::new(1, Duration::from_millis(5));

        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(!limiter.is_allowed("10.0.0.1"));
        std::thread::sleep(Duration::from_millis(10));
        assert!(limiter.is_allowed("10.0.0.1"));
    }
}
