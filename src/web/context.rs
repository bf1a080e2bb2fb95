//! Per-request session context
//!
//! Ties the browser cookie to the session registry and carries flash
//! messages between requests. Handlers call these helpers instead of
//! touching the registry directly.

use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::server::state::AppState;
use crate::session::{Flash, FlashKind, SESSION_COOKIE, SessionUser};

/// Flashed whenever a state-changing request arrives without a valid
/// CSRF token.
pub const CSRF_FAILED_MESSAGE: &str = "Security validation failed. Please try again.";

/// Ensure the request is backed by a live session.
///
/// Returns the jar (with the session cookie added when a new session had
/// to be created) and the session token for registry access.
pub fn establish_session(state: &AppState, jar: CookieJar) -> (CookieJar, String) {
    let presented = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let token = state.sessions.ensure(presented.as_deref());

    if presented.as_deref() == Some(token.as_str()) {
        (jar, token)
    } else {
        let cookie = session_cookie(token.clone());
        (jar.add(cookie), token)
    }
}

/// Remove the session cookie from the browser.
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    jar.remove(cookie)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// The logged-in user attached to the session, if any.
pub fn current_user(state: &AppState, token: &str) -> Option<SessionUser> {
    state.sessions.with(token, |s| s.user().cloned()).flatten()
}

/// Queue a flash message for the next rendered page.
pub fn flash(state: &AppState, token: &str, kind: FlashKind, text: impl Into<String>) {
    let text = text.into();
    state.sessions.with(token, |s| s.push_flash(kind, text));
}

/// Drain the queued flash messages.
pub fn take_flashes(state: &AppState, token: &str) -> Vec<Flash> {
    state
        .sessions
        .with(token, |s| s.take_flash())
        .unwrap_or_default()
}

/// The CSRF token issued with this session.
pub fn csrf_token(state: &AppState, token: &str) -> String {
    state
        .sessions
        .with(token, |s| s.csrf_token().to_string())
        .unwrap_or_default()
}

/// Verify a CSRF token presented by a form or query string.
pub fn csrf_ok(state: &AppState, token: &str, presented: &str) -> bool {
    state
        .sessions
        .with(token, |s| s.csrf_matches(presented))
        .unwrap_or(false)
}

/// Redirect to the listing page for `path`.
pub fn redirect_to_listing(path: &str) -> Redirect {
    Redirect::to(&format!("/?path={}", urlencode(path)))
}

/// Percent-encode a value for use inside a query string or path segment.
pub fn urlencode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}
