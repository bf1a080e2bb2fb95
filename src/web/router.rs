//! Route table
//!
//! Wires every handler to its method and path, and stacks the
//! rate-limiting, logging, and body-limit layers around them.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::sync::Arc;

use crate::middleware::{logging, rate_limit};
use crate::server::state::AppState;
use crate::web::{account, files};

/// Extra room on top of the upload cap for the multipart envelope.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Builds the application router over the shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes() as usize + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(files::list))
        .route(
            "/register",
            get(account::show_register).post(account::register),
        )
        .route("/login", get(account::show_login).post(account::login))
        .route("/logout", get(account::logout))
        .route("/create-folder", post(files::create_folder))
        .route("/upload", post(files::upload))
        .route("/download/*path", get(files::download))
        .route("/delete", post(files::delete))
        .route("/rename", post(files::rename))
        .fallback(files::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(logging::log_requests))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            rate_limit::limit_requests,
        ))
        .with_state(state)
}
