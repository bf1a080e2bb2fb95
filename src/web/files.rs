//! File routes
//!
//! Listing, folder creation, upload, download, delete, and rename. All
//! of them require a signed-in user and operate strictly inside that
//! user's root directory.

use axum::Form;
use axum::body::Body;
use axum::extract::Path as RoutePath;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::error::StorageError;
use crate::error::handlers::{error_to_status, handle_error};
use crate::server::state::AppState;
use crate::session::{FlashKind, SessionUser};
use crate::storage::guard::parent_relative;
use crate::storage::{UploadSink, operations};
use crate::web::context::{
    CSRF_FAILED_MESSAGE, csrf_ok, csrf_token, current_user, establish_session, flash,
    redirect_to_listing, take_flashes,
};
use crate::web::forms::{CreateFolderForm, DeleteForm, ListingQuery, RenameForm, UploadQuery};
use crate::web::views;

/// Resolves the signed-in user, or flashes the login notice and hands
/// back the redirect to the login form.
fn require_user(
    state: &AppState,
    token: &str,
    jar: CookieJar,
) -> Result<(CookieJar, SessionUser), Response> {
    match current_user(state, token) {
        Some(user) => Ok((jar, user)),
        None => {
            flash(
                state,
                token,
                FlashKind::Error,
                "Please log in to access this page",
            );
            Err((jar, Redirect::to("/login")).into_response())
        }
    }
}

/// Builds the breadcrumb trail for a listing path as (label, path)
/// pairs. The root is always present and labelled "Home".
pub fn breadcrumb_trail(path: &str) -> Vec<(String, String)> {
    let mut crumbs = vec![("Home".to_string(), String::new())];
    let mut so_far = String::new();
    for part in path.split('/').filter(|p| !p.is_empty()) {
        if !so_far.is_empty() {
            so_far.push('/');
        }
        so_far.push_str(part);
        crumbs.push((part.to_string(), so_far.clone()));
    }
    crumbs
}

/// Handles the listing page for the directory named by `?path=`.
pub async fn list(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<ListingQuery>,
) -> Response {
    let (jar, token) = establish_session(&state, jar);

    // 1. Only signed-in users get a listing
    let (jar, user) = match require_user(&state, &token, jar) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // 2. The root itself is created on demand so a fresh account always
    //    has somewhere to land
    let root = state.user_root(user.id);
    if query.path.is_empty() {
        if let Err(e) = std::fs::create_dir_all(&root) {
            warn!("Failed to create user directory {}: {}", root.display(), e);
        }
    }

    // 3. Read the directory inside the user's root
    let entries = match operations::list_directory(&root, &query.path) {
        Ok(entries) => entries,
        Err(StorageError::AccessDenied(_)) => {
            warn!("User '{}' denied access to '{}'", user.username, query.path);
            flash(&state, &token, FlashKind::Error, "Access denied");
            return (jar, Redirect::to("/")).into_response();
        }
        Err(e) => {
            let err = e.into();
            handle_error(&err);
            if query.path.is_empty() {
                // A root that cannot be read has nowhere to redirect to
                return (
                    error_to_status(&err),
                    jar,
                    Html(views::error_page("Error", "Failed to read directory")),
                )
                    .into_response();
            }
            flash(&state, &token, FlashKind::Error, "Failed to read directory");
            return (jar, Redirect::to("/")).into_response();
        }
    };

    // 4. Render the listing with breadcrumbs and any pending flashes
    let crumbs = breadcrumb_trail(&query.path);
    let flashes = take_flashes(&state, &token);
    let csrf = csrf_token(&state, &token);
    (
        jar,
        Html(views::index_page(
            &user,
            &query.path,
            &entries,
            &crumbs,
            &flashes,
            &csrf,
        )),
    )
        .into_response()
}

/// Handles folder creation inside the current listing.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<CreateFolderForm>,
) -> Response {
    let (jar, token) = establish_session(&state, jar);

    // 1. Gate and CSRF check
    let (jar, user) = match require_user(&state, &token, jar) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if !csrf_ok(&state, &token, &form.csrf_token) {
        flash(&state, &token, FlashKind::Error, CSRF_FAILED_MESSAGE);
        return (jar, redirect_to_listing(&form.path)).into_response();
    }

    // 2. Create the folder under the user's root
    let root = state.user_root(user.id);
    match operations::create_folder(&root, &form.path, &form.folder_name) {
        Ok(rel) => {
            info!("User '{}' created folder '{}'", user.username, rel);
            flash(
                &state,
                &token,
                FlashKind::Success,
                "Folder created successfully",
            );
        }
        Err(StorageError::AlreadyExists(_)) => {
            flash(&state, &token, FlashKind::Error, "Folder already exists");
        }
        Err(StorageError::AccessDenied(_)) => {
            warn!("User '{}' denied access to '{}'", user.username, form.path);
            flash(&state, &token, FlashKind::Error, "Access denied");
            return (jar, Redirect::to("/")).into_response();
        }
        Err(e) => {
            handle_error(&e.into());
            flash(&state, &token, FlashKind::Error, "Failed to create folder");
        }
    }

    // 3. Back to the listing the form was submitted from
    (jar, redirect_to_listing(&form.path)).into_response()
}

/// Handles a multipart file upload into the directory named by the
/// `path` query parameter. The CSRF token also rides in the query
/// string so the body stays file-only.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Response {
    let (jar, token) = establish_session(&state, jar);

    // 1. Gate and CSRF check
    let (jar, user) = match require_user(&state, &token, jar) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if !csrf_ok(&state, &token, &query.csrf_token) {
        flash(&state, &token, FlashKind::Error, CSRF_FAILED_MESSAGE);
        return (jar, redirect_to_listing(&query.path)).into_response();
    }

    let root = state.user_root(user.id);
    let max_bytes = state.config.max_upload_bytes();

    // 2. Walk the multipart body looking for the file field
    let mut outcome: Option<(FlashKind, String)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read multipart body: {e}");
                outcome = Some((FlashKind::Error, "Failed to upload file".to_string()));
                break;
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };

        // 3. Stream the field to disk; one file per request
        outcome = Some(store_field(&root, &query.path, &filename, max_bytes, field).await);
        break;
    }

    let (kind, text) = outcome.unwrap_or((FlashKind::Error, "No file selected".to_string()));
    if kind == FlashKind::Success {
        info!("User '{}' uploaded a file to '{}'", user.username, query.path);
    }
    flash(&state, &token, kind, text);
    (jar, redirect_to_listing(&query.path)).into_response()
}

/// Streams one multipart field through an [`UploadSink`] and maps the
/// result to the flash message shown after the redirect.
async fn store_field(
    root: &Path,
    rel_dir: &str,
    filename: &str,
    max_bytes: u64,
    mut field: Field<'_>,
) -> (FlashKind, String) {
    let mut sink = match UploadSink::create(root, rel_dir, filename, max_bytes).await {
        Ok(sink) => sink,
        Err(StorageError::InvalidFileType(_)) => {
            return (FlashKind::Error, "Error: Invalid file type!".to_string());
        }
        Err(StorageError::AccessDenied(_)) => {
            warn!("Upload of '{filename}' denied outside user root");
            return (FlashKind::Error, "Access denied".to_string());
        }
        Err(e) => {
            handle_error(&e.into());
            return (FlashKind::Error, "Failed to upload file".to_string());
        }
    };

    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = sink.write_chunk(&chunk).await {
                    return match e {
                        StorageError::TooLarge(_) => {
                            (FlashKind::Error, "File too large".to_string())
                        }
                        other => {
                            handle_error(&other.into());
                            (FlashKind::Error, "Failed to upload file".to_string())
                        }
                    };
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("Upload stream interrupted for '{filename}': {e}");
                sink.abort().await;
                return (FlashKind::Error, "Failed to upload file".to_string());
            }
        }
    }

    match sink.finish().await {
        Ok(path) => {
            info!("Stored upload '{}' at {}", filename, path.display());
            (FlashKind::Success, "File uploaded successfully".to_string())
        }
        Err(e) => {
            handle_error(&e.into());
            (FlashKind::Error, "Failed to upload file".to_string())
        }
    }
}

/// Streams a file back to the browser as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    RoutePath(rel_path): RoutePath<String>,
) -> Response {
    let (jar, token) = establish_session(&state, jar);

    // 1. Gate
    let (jar, user) = match require_user(&state, &token, jar) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // 2. Resolve the file inside the user's root
    let root = state.user_root(user.id);
    let download = match operations::prepare_download(&root, &rel_path) {
        Ok(d) => d,
        Err(StorageError::Unsupported(_)) => {
            flash(
                &state,
                &token,
                FlashKind::Error,
                "Directory download not implemented yet",
            );
            return (jar, redirect_to_listing(&parent_relative(&rel_path))).into_response();
        }
        Err(StorageError::AccessDenied(_)) => {
            warn!("User '{}' denied access to '{}'", user.username, rel_path);
            flash(&state, &token, FlashKind::Error, "Access denied");
            return (jar, Redirect::to("/")).into_response();
        }
        Err(e) => {
            handle_error(&e.into());
            flash(&state, &token, FlashKind::Error, "Failed to download file");
            return (jar, Redirect::to("/")).into_response();
        }
    };

    // 3. Open and stream the file
    let file = match tokio::fs::File::open(&download.path).await {
        Ok(file) => file,
        Err(e) => {
            error!(
                "Failed to open {} for download: {}",
                download.path.display(),
                e
            );
            flash(&state, &token, FlashKind::Error, "Failed to download file");
            return (jar, Redirect::to("/")).into_response();
        }
    };

    info!(
        "User '{}' downloading '{}' ({} bytes)",
        user.username, download.file_name, download.size
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(download.size));
    let disposition = format!(
        "attachment; filename=\"{}\"",
        download.file_name.replace('"', "'")
    );
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    let body = Body::from_stream(ReaderStream::new(file));
    (jar, headers, body).into_response()
}

/// Deletes a file or folder and returns to the parent listing.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<DeleteForm>,
) -> Response {
    let (jar, token) = establish_session(&state, jar);

    // 1. Gate and CSRF check
    let (jar, user) = match require_user(&state, &token, jar) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let parent = parent_relative(&form.path);
    if !csrf_ok(&state, &token, &form.csrf_token) {
        flash(&state, &token, FlashKind::Error, CSRF_FAILED_MESSAGE);
        return (jar, redirect_to_listing(&parent)).into_response();
    }

    // 2. Delete the entry, directories recursively
    let root = state.user_root(user.id);
    match operations::delete_entry(&root, &form.path) {
        Ok(()) => {
            info!("User '{}' deleted '{}'", user.username, form.path);
            flash(
                &state,
                &token,
                FlashKind::Success,
                "Item deleted successfully",
            );
        }
        Err(StorageError::AccessDenied(_)) => {
            warn!("User '{}' denied access to '{}'", user.username, form.path);
            flash(&state, &token, FlashKind::Error, "Access denied");
            return (jar, Redirect::to("/")).into_response();
        }
        Err(e) => {
            handle_error(&e.into());
            flash(&state, &token, FlashKind::Error, "Failed to delete item");
        }
    }

    // 3. Back to the parent listing
    (jar, redirect_to_listing(&parent)).into_response()
}

/// Renames a file or folder in place, keeping it in the same directory.
pub async fn rename(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RenameForm>,
) -> Response {
    let (jar, token) = establish_session(&state, jar);

    // 1. Gate and CSRF check
    let (jar, user) = match require_user(&state, &token, jar) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let parent = parent_relative(&form.old_path);
    if !csrf_ok(&state, &token, &form.csrf_token) {
        flash(&state, &token, FlashKind::Error, CSRF_FAILED_MESSAGE);
        return (jar, redirect_to_listing(&parent)).into_response();
    }

    // 2. Rename; an occupied destination is refused, never overwritten
    let root = state.user_root(user.id);
    match operations::rename_entry(&root, &form.old_path, &form.new_name) {
        Ok(new_rel) => {
            info!(
                "User '{}' renamed '{}' to '{}'",
                user.username, form.old_path, new_rel
            );
            flash(
                &state,
                &token,
                FlashKind::Success,
                "Item renamed successfully",
            );
        }
        Err(StorageError::AlreadyExists(_)) => {
            flash(
                &state,
                &token,
                FlashKind::Error,
                "An item with that name already exists",
            );
        }
        Err(StorageError::AccessDenied(_)) => {
            warn!(
                "User '{}' denied access to '{}'",
                user.username, form.old_path
            );
            flash(&state, &token, FlashKind::Error, "Access denied");
            return (jar, Redirect::to("/")).into_response();
        }
        Err(e) => {
            handle_error(&e.into());
            flash(&state, &token, FlashKind::Error, "Failed to rename item");
        }
    }

    // 3. Back to the listing that held the entry
    (jar, redirect_to_listing(&parent)).into_response()
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(views::error_page("Error", "Page not found")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breadcrumb_trail_for_root_is_home_only() {
        let crumbs = breadcrumb_trail("");
        assert_eq!(crumbs, vec![("Home".to_string(), String::new())]);
    }

    #[test]
    fn breadcrumb_trail_accumulates_paths() {
        let crumbs = breadcrumb_trail("docs/reports/q1");
        assert_eq!(
            crumbs,
            vec![
                ("Home".to_string(), "".to_string()),
                ("docs".to_string(), "docs".to_string()),
                ("reports".to_string(), "docs/reports".to_string()),
                ("q1".to_string(), "docs/reports/q1".to_string()),
            ]
        );
    }

    #[test]
    fn breadcrumb_trail_skips_empty_segments() {
        let crumbs = breadcrumb_trail("docs//reports");
        assert_eq!(crumbs.len(), 3);
        assert_eq!(crumbs[2].1, "docs/reports");
    }
}
