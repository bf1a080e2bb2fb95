//! Form and query DTOs
//!
//! One typed struct per route input. CSRF tokens travel in a `_csrf`
//! field (ordinary forms) or query parameter (the multipart upload).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "_csrf", default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Username or email; anything containing `@` is treated as an email
    pub identifier: String,
    pub password: String,
    #[serde(rename = "_csrf", default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListingQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderForm {
    pub folder_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "_csrf", default)]
    pub csrf_token: String,
}

/// Query parameters of the multipart upload request
#[derive(Debug, Deserialize, Default)]
pub struct UploadQuery {
    #[serde(default)]
    pub path: String,
    #[serde(rename = "_csrf", default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub path: String,
    #[serde(rename = "_csrf", default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameForm {
    pub old_path: String,
    pub new_name: String,
    #[serde(rename = "_csrf", default)]
    pub csrf_token: String,
}
