//! Logging middleware
//!
//! Logs one line per handled request.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::info;

/// Log method, path, and response status for every request.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    info!("{} {} -> {}", method, path, response.status());
    response
}
