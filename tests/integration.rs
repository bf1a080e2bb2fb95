use std::fs;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Path, Query, State};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use rusqlite::Connection;
use tempfile::TempDir;

use fileshelf::auth::credentials;
use fileshelf::config::AppConfig;
use fileshelf::server::AppState;
use fileshelf::session::{FlashKind, SESSION_COOKIE, SessionUser};
use fileshelf::web::context::{csrf_token, current_user, take_flashes};
use fileshelf::web::forms::{
    CreateFolderForm, DeleteForm, ListingQuery, LoginForm, RegisterForm, RenameForm, UploadQuery,
};
use fileshelf::web::{account, files};

// Helper to build a state over a throwaway storage root and an
// in-memory database
fn test_state() -> (Arc<AppState>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.user_files_dir = dir.path().join("files").to_string_lossy().into_owned();

    let conn = Connection::open_in_memory().unwrap();
    credentials::run_migrations(&conn).unwrap();

    (Arc::new(AppState::new(config, conn)), dir)
}

// Helper to create a user, log them into a fresh session, and hand
// back the cookie jar a browser would send
fn signed_in(state: &Arc<AppState>, username: &str, email: &str) -> (CookieJar, String, i64) {
    let id = {
        let conn = state.db();
        credentials::create_user(&conn, username, email, "password123").unwrap()
    };
    fs::create_dir_all(state.user_root(id)).unwrap();

    let token = state.sessions.create();
    state.sessions.with(&token, |s| {
        s.set_user(SessionUser {
            id,
            username: username.to_string(),
            email: email.to_string(),
        })
    });

    let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, token.clone()));
    (jar, token, id)
}

// Helper for a session that has not logged in yet
fn anonymous(state: &Arc<AppState>) -> (CookieJar, String) {
    let token = state.sessions.create();
    let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, token.clone()));
    (jar, token)
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// Helper to build the Multipart extractor the upload handler consumes
async fn multipart_with_file(filename: &str, content: &[u8]) -> Multipart {
    let mut body = Vec::new();
    body.extend_from_slice(b"--BOUNDARY\r\n");
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");

    let request = Request::builder()
        .header(
            header::CONTENT_TYPE,
            "multipart/form-data; boundary=BOUNDARY",
        )
        .body(Body::from(body))
        .unwrap();
    Multipart::from_request(request, &()).await.unwrap()
}

#[tokio::test]
async fn register_creates_user_and_redirects_to_login() {
    let (state, _dir) = test_state();
    let (jar, token) = anonymous(&state);
    let csrf = csrf_token(&state, &token);

    let response = account::register(
        State(state.clone()),
        jar,
        axum::Form(RegisterForm {
            name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret123".to_string(),
            csrf_token: csrf,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let stored = {
        let conn = state.db();
        credentials::find_by_email(&conn, "alice@example.com").unwrap()
    };
    let stored = stored.unwrap();
    assert_eq!(stored.username, "alice");
    assert!(state.user_root(stored.id).is_dir());

    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes.len(), 1);
    assert_eq!(flashes[0].kind, FlashKind::Success);
    assert_eq!(flashes[0].text, "You are now registered and can log in");
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let (state, _dir) = test_state();
    {
        let conn = state.db();
        credentials::create_user(&conn, "alice", "alice@example.com", "secret123").unwrap();
    }
    let (jar, token) = anonymous(&state);
    let csrf = csrf_token(&state, &token);

    let response = account::register(
        State(state.clone()),
        jar,
        axum::Form(RegisterForm {
            name: "other".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret123".to_string(),
            csrf_token: csrf,
        }),
    )
    .await;

    assert_eq!(location(&response), "/register");
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "Email already registered");
}

#[tokio::test]
async fn register_rejects_short_password() {
    let (state, _dir) = test_state();
    let (jar, token) = anonymous(&state);
    let csrf = csrf_token(&state, &token);

    let response = account::register(
        State(state.clone()),
        jar,
        axum::Form(RegisterForm {
            name: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "short".to_string(),
            csrf_token: csrf,
        }),
    )
    .await;

    assert_eq!(location(&response), "/register");
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "Password must be at least 6 characters");

    let conn = state.db();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn register_rejects_bad_csrf_token() {
    let (state, _dir) = test_state();
    let (jar, token) = anonymous(&state);

    let response = account::register(
        State(state.clone()),
        jar,
        axum::Form(RegisterForm {
            name: "mallory".to_string(),
            email: "mallory@example.com".to_string(),
            password: "secret123".to_string(),
            csrf_token: "forged".to_string(),
        }),
    )
    .await;

    assert_eq!(location(&response), "/register");
    let flashes = take_flashes(&state, &token);
    assert_eq!(
        flashes[0].text,
        "Security validation failed. Please try again."
    );
}

#[tokio::test]
async fn login_attaches_identity_to_session() {
    let (state, _dir) = test_state();
    {
        let conn = state.db();
        credentials::create_user(&conn, "alice", "alice@example.com", "secret123").unwrap();
    }
    let (jar, token) = anonymous(&state);
    let csrf = csrf_token(&state, &token);

    let response = account::login(
        State(state.clone()),
        jar,
        axum::Form(LoginForm {
            identifier: "alice@example.com".to_string(),
            password: "secret123".to_string(),
            csrf_token: csrf,
        }),
    )
    .await;

    assert_eq!(location(&response), "/");
    let user = current_user(&state, &token).unwrap();
    assert_eq!(user.username, "alice");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let (state, _dir) = test_state();
    {
        let conn = state.db();
        credentials::create_user(&conn, "alice", "alice@example.com", "secret123").unwrap();
    }
    let (jar, token) = anonymous(&state);
    let csrf = csrf_token(&state, &token);

    let response = account::login(
        State(state.clone()),
        jar,
        axum::Form(LoginForm {
            identifier: "alice".to_string(),
            password: "wrong-password".to_string(),
            csrf_token: csrf,
        }),
    )
    .await;

    assert_eq!(location(&response), "/login");
    assert!(current_user(&state, &token).is_none());
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "Invalid credentials");
}

#[tokio::test]
async fn logout_destroys_the_session() {
    let (state, _dir) = test_state();
    let (jar, token, _id) = signed_in(&state, "alice", "alice@example.com");

    let response = account::logout(State(state.clone()), jar).await;

    assert_eq!(location(&response), "/login");
    assert!(current_user(&state, &token).is_none());
}

#[tokio::test]
async fn listing_requires_login() {
    let (state, _dir) = test_state();
    let (jar, token) = anonymous(&state);

    let response = files::list(
        State(state.clone()),
        jar,
        Query(ListingQuery {
            path: String::new(),
        }),
    )
    .await;

    assert_eq!(location(&response), "/login");
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "Please log in to access this page");
}

#[tokio::test]
async fn listing_shows_directory_contents() {
    let (state, _dir) = test_state();
    let (jar, _token, id) = signed_in(&state, "alice", "alice@example.com");
    let root = state.user_root(id);
    fs::write(root.join("notes.txt"), b"hello").unwrap();
    fs::create_dir(root.join("photos")).unwrap();

    let response = files::list(
        State(state.clone()),
        jar,
        Query(ListingQuery {
            path: String::new(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("notes.txt"));
    assert!(body.contains("photos"));
}

#[tokio::test]
async fn listing_rejects_path_outside_user_root() {
    let (state, _dir) = test_state();
    let (_jar_a, _token_a, id_a) = signed_in(&state, "alice", "alice@example.com");
    let (jar_b, token_b, _id_b) = signed_in(&state, "bob", "bob@example.com");
    fs::write(state.user_root(id_a).join("private.txt"), b"secret").unwrap();

    let response = files::list(
        State(state.clone()),
        jar_b,
        Query(ListingQuery {
            path: format!("../{id_a}"),
        }),
    )
    .await;

    assert_eq!(location(&response), "/");
    let flashes = take_flashes(&state, &token_b);
    assert_eq!(flashes[0].text, "Access denied");
}

#[tokio::test]
async fn create_folder_then_duplicate() {
    let (state, _dir) = test_state();
    let (jar, token, id) = signed_in(&state, "alice", "alice@example.com");
    let csrf = csrf_token(&state, &token);

    let response = files::create_folder(
        State(state.clone()),
        jar.clone(),
        axum::Form(CreateFolderForm {
            folder_name: "docs".to_string(),
            path: String::new(),
            csrf_token: csrf.clone(),
        }),
    )
    .await;

    assert_eq!(location(&response), "/?path=");
    assert!(state.user_root(id).join("docs").is_dir());
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].kind, FlashKind::Success);
    assert_eq!(flashes[0].text, "Folder created successfully");

    let response = files::create_folder(
        State(state.clone()),
        jar,
        axum::Form(CreateFolderForm {
            folder_name: "docs".to_string(),
            path: String::new(),
            csrf_token: csrf,
        }),
    )
    .await;

    assert_eq!(location(&response), "/?path=");
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].kind, FlashKind::Error);
    assert_eq!(flashes[0].text, "Folder already exists");
}

#[tokio::test]
async fn upload_stores_file_in_requested_directory() {
    let (state, _dir) = test_state();
    let (jar, token, id) = signed_in(&state, "alice", "alice@example.com");
    fs::create_dir(state.user_root(id).join("docs")).unwrap();
    let csrf = csrf_token(&state, &token);

    let multipart = multipart_with_file("report.txt", b"quarterly numbers").await;
    let response = files::upload(
        State(state.clone()),
        jar,
        Query(UploadQuery {
            path: "docs".to_string(),
            csrf_token: csrf,
        }),
        multipart,
    )
    .await;

    assert_eq!(location(&response), "/?path=docs");
    let stored = fs::read(state.user_root(id).join("docs/report.txt")).unwrap();
    assert_eq!(stored, b"quarterly numbers");
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "File uploaded successfully");
}

#[tokio::test]
async fn upload_rejects_disallowed_extension() {
    let (state, _dir) = test_state();
    let (jar, token, id) = signed_in(&state, "alice", "alice@example.com");
    let csrf = csrf_token(&state, &token);

    let multipart = multipart_with_file("payload.exe", b"MZ").await;
    let response = files::upload(
        State(state.clone()),
        jar,
        Query(UploadQuery {
            path: String::new(),
            csrf_token: csrf,
        }),
        multipart,
    )
    .await;

    assert_eq!(location(&response), "/?path=");
    assert!(!state.user_root(id).join("payload.exe").exists());
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "Error: Invalid file type!");
}

#[tokio::test]
async fn upload_without_file_field_flashes_notice() {
    let (state, _dir) = test_state();
    let (jar, token, _id) = signed_in(&state, "alice", "alice@example.com");
    let csrf = csrf_token(&state, &token);

    let request = Request::builder()
        .header(
            header::CONTENT_TYPE,
            "multipart/form-data; boundary=BOUNDARY",
        )
        .body(Body::from(&b"--BOUNDARY--\r\n"[..]))
        .unwrap();
    let multipart = Multipart::from_request(request, &()).await.unwrap();

    let response = files::upload(
        State(state.clone()),
        jar,
        Query(UploadQuery {
            path: String::new(),
            csrf_token: csrf,
        }),
        multipart,
    )
    .await;

    assert_eq!(location(&response), "/?path=");
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "No file selected");
}

#[tokio::test]
async fn download_streams_file_as_attachment() {
    let (state, _dir) = test_state();
    let (jar, _token, id) = signed_in(&state, "alice", "alice@example.com");
    fs::write(state.user_root(id).join("notes.txt"), b"hello world").unwrap();

    let response = files::download(
        State(state.clone()),
        jar,
        Path("notes.txt".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"notes.txt\""
    );
    let body = body_string(response).await;
    assert_eq!(body, "hello world");
}

#[tokio::test]
async fn download_of_directory_flashes_notice() {
    let (state, _dir) = test_state();
    let (jar, token, id) = signed_in(&state, "alice", "alice@example.com");
    fs::create_dir(state.user_root(id).join("docs")).unwrap();

    let response = files::download(State(state.clone()), jar, Path("docs".to_string())).await;

    assert_eq!(location(&response), "/?path=");
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "Directory download not implemented yet");
}

#[tokio::test]
async fn delete_removes_file_and_returns_to_parent() {
    let (state, _dir) = test_state();
    let (jar, token, id) = signed_in(&state, "alice", "alice@example.com");
    let root = state.user_root(id);
    fs::create_dir(root.join("docs")).unwrap();
    fs::write(root.join("docs/old.txt"), b"stale").unwrap();
    let csrf = csrf_token(&state, &token);

    let response = files::delete(
        State(state.clone()),
        jar,
        axum::Form(DeleteForm {
            path: "docs/old.txt".to_string(),
            csrf_token: csrf,
        }),
    )
    .await;

    assert_eq!(location(&response), "/?path=docs");
    assert!(!root.join("docs/old.txt").exists());
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "Item deleted successfully");
}

#[tokio::test]
async fn delete_with_bad_csrf_leaves_file_alone() {
    let (state, _dir) = test_state();
    let (jar, token, id) = signed_in(&state, "alice", "alice@example.com");
    let root = state.user_root(id);
    fs::write(root.join("keep.txt"), b"important").unwrap();

    let response = files::delete(
        State(state.clone()),
        jar,
        axum::Form(DeleteForm {
            path: "keep.txt".to_string(),
            csrf_token: "forged".to_string(),
        }),
    )
    .await;

    assert_eq!(location(&response), "/?path=");
    assert!(root.join("keep.txt").exists());
    let flashes = take_flashes(&state, &token);
    assert_eq!(
        flashes[0].text,
        "Security validation failed. Please try again."
    );
}

#[tokio::test]
async fn rename_moves_entry_within_its_directory() {
    let (state, _dir) = test_state();
    let (jar, token, id) = signed_in(&state, "alice", "alice@example.com");
    let root = state.user_root(id);
    fs::write(root.join("draft.txt"), b"v1").unwrap();
    let csrf = csrf_token(&state, &token);

    let response = files::rename(
        State(state.clone()),
        jar,
        axum::Form(RenameForm {
            old_path: "draft.txt".to_string(),
            new_name: "final.txt".to_string(),
            csrf_token: csrf,
        }),
    )
    .await;

    assert_eq!(location(&response), "/?path=");
    assert!(!root.join("draft.txt").exists());
    assert_eq!(fs::read(root.join("final.txt")).unwrap(), b"v1");
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "Item renamed successfully");
}

#[tokio::test]
async fn rename_refuses_to_overwrite_existing_entry() {
    let (state, _dir) = test_state();
    let (jar, token, id) = signed_in(&state, "alice", "alice@example.com");
    let root = state.user_root(id);
    fs::write(root.join("a.txt"), b"first").unwrap();
    fs::write(root.join("b.txt"), b"second").unwrap();
    let csrf = csrf_token(&state, &token);

    let response = files::rename(
        State(state.clone()),
        jar,
        axum::Form(RenameForm {
            old_path: "a.txt".to_string(),
            new_name: "b.txt".to_string(),
            csrf_token: csrf,
        }),
    )
    .await;

    assert_eq!(location(&response), "/?path=");
    assert_eq!(fs::read(root.join("a.txt")).unwrap(), b"first");
    assert_eq!(fs::read(root.join("b.txt")).unwrap(), b"second");
    let flashes = take_flashes(&state, &token);
    assert_eq!(flashes[0].text, "An item with that name already exists");
}

#[tokio::test]
async fn delete_refuses_path_outside_user_root() {
    let (state, _dir) = test_state();
    let (_jar_a, _token_a, id_a) = signed_in(&state, "alice", "alice@example.com");
    let (jar_b, token_b, _id_b) = signed_in(&state, "bob", "bob@example.com");
    let target = state.user_root(id_a).join("private.txt");
    fs::write(&target, b"secret").unwrap();
    let csrf = csrf_token(&state, &token_b);

    let response = files::delete(
        State(state.clone()),
        jar_b,
        axum::Form(DeleteForm {
            path: format!("../{id_a}/private.txt"),
            csrf_token: csrf,
        }),
    )
    .await;

    assert_eq!(location(&response), "/");
    assert!(target.exists());
    let flashes = take_flashes(&state, &token_b);
    assert_eq!(flashes[0].text, "Access denied");
}
