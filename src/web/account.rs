//! Account routes
//!
//! Registration, login, and logout. Logged-in visitors are forwarded
//! away from the auth forms; everyone else gets a session (and with it
//! a CSRF token) as soon as they load one.

use axum::Form;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use log::{info, warn};
use std::sync::Arc;

use crate::auth::{self, credentials};
use crate::error::AuthError;
use crate::error::handlers::handle_error;
use crate::server::state::AppState;
use crate::session::{FlashKind, SESSION_COOKIE, SessionUser};
use crate::web::context::{
    CSRF_FAILED_MESSAGE, clear_session_cookie, csrf_ok, csrf_token, current_user,
    establish_session, flash, take_flashes,
};
use crate::web::forms::{LoginForm, RegisterForm};
use crate::web::views;

/// Renders the registration form.
pub async fn show_register(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, token) = establish_session(&state, jar);

    if current_user(&state, &token).is_some() {
        return (jar, Redirect::to("/")).into_response();
    }

    let flashes = take_flashes(&state, &token);
    let csrf = csrf_token(&state, &token);
    (jar, Html(views::register_page(&flashes, &csrf))).into_response()
}

/// Handles a registration attempt: validates input, inserts the user,
/// and creates the user's root directory.
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let (jar, token) = establish_session(&state, jar);

    // 1. Forward logged-in users, check the CSRF token
    if current_user(&state, &token).is_some() {
        return (jar, Redirect::to("/")).into_response();
    }
    if !csrf_ok(&state, &token, &form.csrf_token) {
        flash(&state, &token, FlashKind::Error, CSRF_FAILED_MESSAGE);
        return (jar, Redirect::to("/register")).into_response();
    }

    // 2. Validate the form; the first failing rule is flashed back
    if let Err(e) = auth::validate_registration(&form.name, &form.email, &form.password) {
        flash(&state, &token, FlashKind::Error, e.0);
        return (jar, Redirect::to("/register")).into_response();
    }

    // 3. Insert the user; the UNIQUE constraints decide races
    let created = {
        let conn = state.db();
        credentials::create_user(&conn, &form.name, &form.email, &form.password)
    };

    let user_id = match created {
        Ok(id) => id,
        Err(AuthError::EmailTaken(_)) => {
            flash(&state, &token, FlashKind::Error, "Email already registered");
            return (jar, Redirect::to("/register")).into_response();
        }
        Err(AuthError::UsernameTaken(_)) => {
            flash(&state, &token, FlashKind::Error, "Username already taken");
            return (jar, Redirect::to("/register")).into_response();
        }
        Err(e) => {
            handle_error(&e.into());
            flash(&state, &token, FlashKind::Error, "Failed to create account");
            return (jar, Redirect::to("/register")).into_response();
        }
    };

    // 4. Create the user's root directory
    let root = state.user_root(user_id);
    if let Err(e) = std::fs::create_dir_all(&root) {
        warn!(
            "Failed to create user directory {}: {}",
            root.display(),
            e
        );
    }

    info!("Registered user '{}' (id {})", form.name, user_id);
    flash(
        &state,
        &token,
        FlashKind::Success,
        "You are now registered and can log in",
    );
    (jar, Redirect::to("/login")).into_response()
}

/// Renders the login form.
pub async fn show_login(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, token) = establish_session(&state, jar);

    if current_user(&state, &token).is_some() {
        return (jar, Redirect::to("/")).into_response();
    }

    let flashes = take_flashes(&state, &token);
    let csrf = csrf_token(&state, &token);
    (jar, Html(views::login_page(&flashes, &csrf))).into_response()
}

/// Handles a login attempt and attaches the identity to the session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let (jar, token) = establish_session(&state, jar);

    // 1. Forward logged-in users, check the CSRF token
    if current_user(&state, &token).is_some() {
        return (jar, Redirect::to("/")).into_response();
    }
    if !csrf_ok(&state, &token, &form.csrf_token) {
        flash(&state, &token, FlashKind::Error, CSRF_FAILED_MESSAGE);
        return (jar, Redirect::to("/login")).into_response();
    }

    // 2. Shape check; malformed input reads the same as a wrong password
    if auth::validate_login(&form.identifier, &form.password).is_err() {
        flash(&state, &token, FlashKind::Error, "Invalid credentials");
        return (jar, Redirect::to("/login")).into_response();
    }

    // 3. Check the identifier/password pair against the store
    let authenticated = {
        let conn = state.db();
        credentials::authenticate(&conn, &form.identifier, &form.password)
    };

    match authenticated {
        Ok(user) => {
            // 4. Attach identity to the session
            state.sessions.with(&token, |s| {
                s.set_user(SessionUser {
                    id: user.id,
                    username: user.username.clone(),
                    email: user.email.clone(),
                })
            });
            info!("User '{}' logged in", user.username);
            (jar, Redirect::to("/")).into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            flash(&state, &token, FlashKind::Error, "Invalid credentials");
            (jar, Redirect::to("/login")).into_response()
        }
        Err(e) => {
            handle_error(&e.into());
            flash(&state, &token, FlashKind::Error, "Server error");
            (jar, Redirect::to("/login")).into_response()
        }
    }
}

/// Destroys the session and clears the browser cookie.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        if let Some(user) = current_user(&state, &token) {
            info!("User '{}' logged out", user.username);
        }
        state.sessions.destroy(&token);
    }

    let jar = clear_session_cookie(jar);
    (jar, Redirect::to("/login")).into_response()
}
