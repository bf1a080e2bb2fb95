//! Server-rendered views
//!
//! All pages are assembled as plain HTML strings. Every interpolated
//! value goes through `escape_html`; URLs additionally go through the
//! query encoder so entry names cannot break out of attributes.

use crate::session::{Flash, FlashKind, SessionUser};
use crate::storage::EntryInfo;
use crate::web::context::urlencode;

const STYLE: &str = "
body { font-family: sans-serif; margin: 2rem auto; max-width: 56rem; color: #222; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #ddd; }
form.inline { display: inline; margin-right: 0.4rem; }
nav { margin-bottom: 1rem; }
.flash { padding: 0.5rem 0.8rem; margin: 0.4rem 0; border-radius: 4px; }
.flash-error { background: #fbe3e4; color: #8a1f11; }
.flash-success { background: #e6efc2; color: #264409; }
.breadcrumb { margin: 0.8rem 0; }
.panel { margin: 1rem 0; padding: 0.8rem; background: #f6f6f6; border-radius: 4px; }
input[type=text], input[type=email], input[type=password] { padding: 0.3rem; }
";

/// Escape text for interpolation into HTML bodies and attributes.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn layout(title: &str, nav: &str, flashes: &[Flash], body: &str) -> String {
    let mut flash_html = String::new();
    for flash in flashes {
        let class = match flash.kind {
            FlashKind::Success => "flash flash-success",
            FlashKind::Error => "flash flash-error",
        };
        flash_html.push_str(&format!(
            "<div class=\"{}\">{}</div>\n",
            class,
            escape_html(&flash.text)
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} - FileShelf</title>\n<style>{}</style>\n</head>\n<body>\n\
         <nav>{}</nav>\n{}{}\n</body>\n</html>\n",
        escape_html(title),
        STYLE,
        nav,
        flash_html,
        body
    )
}

/// Login form page.
pub fn login_page(flashes: &[Flash], csrf_token: &str) -> String {
    let body = format!(
        "<h1>Log in</h1>\n\
         <form method=\"post\" action=\"/login\">\n\
         <p><label>Username or email<br>\
         <input type=\"text\" name=\"identifier\" required></label></p>\n\
         <p><label>Password<br>\
         <input type=\"password\" name=\"password\" required></label></p>\n\
         <input type=\"hidden\" name=\"_csrf\" value=\"{}\">\n\
         <p><button type=\"submit\">Log in</button></p>\n\
         </form>\n\
         <p>No account? <a href=\"/register\">Register</a></p>",
        escape_html(csrf_token)
    );
    layout("Login", nav_anonymous(), flashes, &body)
}

/// Registration form page.
pub fn register_page(flashes: &[Flash], csrf_token: &str) -> String {
    let body = format!(
        "<h1>Register</h1>\n\
         <form method=\"post\" action=\"/register\">\n\
         <p><label>Username<br>\
         <input type=\"text\" name=\"name\" required></label></p>\n\
         <p><label>Email<br>\
         <input type=\"email\" name=\"email\" required></label></p>\n\
         <p><label>Password<br>\
         <input type=\"password\" name=\"password\" required></label></p>\n\
         <input type=\"hidden\" name=\"_csrf\" value=\"{}\">\n\
         <p><button type=\"submit\">Create account</button></p>\n\
         </form>\n\
         <p>Already registered? <a href=\"/login\">Log in</a></p>",
        escape_html(csrf_token)
    );
    layout("Register", nav_anonymous(), flashes, &body)
}

/// Directory listing page with breadcrumb, upload and folder forms, and
/// per-entry actions.
pub fn index_page(
    user: &SessionUser,
    current_path: &str,
    entries: &[EntryInfo],
    breadcrumb: &[(String, String)],
    flashes: &[Flash],
    csrf_token: &str,
) -> String {
    let csrf = escape_html(csrf_token);
    let enc_path = escape_html(&urlencode(current_path));

    let mut body = String::new();
    body.push_str("<h1>Your files</h1>\n");

    // Breadcrumb trail
    body.push_str("<div class=\"breadcrumb\">");
    for (i, (name, path)) in breadcrumb.iter().enumerate() {
        if i > 0 {
            body.push_str(" / ");
        }
        body.push_str(&format!(
            "<a href=\"/?path={}\">{}</a>",
            escape_html(&urlencode(path)),
            escape_html(name)
        ));
    }
    body.push_str("</div>\n");

    // Upload and create-folder panels
    body.push_str(&format!(
        "<div class=\"panel\">\n\
         <form method=\"post\" action=\"/upload?path={}&amp;_csrf={}\" \
         enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\">\n\
         <button type=\"submit\">Upload</button>\n\
         </form>\n\
         <form method=\"post\" action=\"/create-folder\">\n\
         <input type=\"text\" name=\"folder_name\" placeholder=\"New folder name\" required>\n\
         <input type=\"hidden\" name=\"path\" value=\"{}\">\n\
         <input type=\"hidden\" name=\"_csrf\" value=\"{}\">\n\
         <button type=\"submit\">Create folder</button>\n\
         </form>\n\
         </div>\n",
        enc_path,
        csrf,
        escape_html(current_path),
        csrf
    ));

    // Entry table
    body.push_str(
        "<table>\n<tr><th>Name</th><th>Size</th><th>Modified</th><th>Actions</th></tr>\n",
    );
    for entry in entries {
        let name = escape_html(&entry.name);
        let rel = escape_html(&entry.rel_path);
        let enc_rel = escape_html(&urlencode(&entry.rel_path));

        let link = if entry.is_directory {
            format!("<a href=\"/?path={}\">{}/</a>", enc_rel, name)
        } else {
            format!("<a href=\"/download/{}\">{}</a>", enc_rel, name)
        };
        let size = if entry.is_directory {
            "-".to_string()
        } else {
            format!("{}", entry.size)
        };

        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>\n\
             <form class=\"inline\" method=\"post\" action=\"/rename\">\n\
             <input type=\"hidden\" name=\"old_path\" value=\"{}\">\n\
             <input type=\"text\" name=\"new_name\" value=\"{}\" size=\"12\">\n\
             <input type=\"hidden\" name=\"_csrf\" value=\"{}\">\n\
             <button type=\"submit\">Rename</button>\n\
             </form>\n\
             <form class=\"inline\" method=\"post\" action=\"/delete\">\n\
             <input type=\"hidden\" name=\"path\" value=\"{}\">\n\
             <input type=\"hidden\" name=\"_csrf\" value=\"{}\">\n\
             <button type=\"submit\">Delete</button>\n\
             </form>\n\
             </td></tr>\n",
            link,
            size,
            escape_html(&entry.last_modified),
            rel,
            name,
            csrf,
            rel,
            csrf
        ));
    }
    if entries.is_empty() {
        body.push_str("<tr><td colspan=\"4\">This folder is empty</td></tr>\n");
    }
    body.push_str("</table>\n");

    let nav = format!(
        "Signed in as <strong>{}</strong> | <a href=\"/\">Home</a> | \
         <a href=\"/logout\">Log out</a>",
        escape_html(&user.username)
    );
    layout("Files", &nav, flashes, &body)
}

/// Generic error page, used for 404s and unexpected failures.
pub fn error_page(title: &str, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to your files</a></p>",
        escape_html(title),
        escape_html(message)
    );
    layout(title, nav_anonymous(), &[], &body)
}

fn nav_anonymous() -> &'static str {
    "<a href=\"/login\">Log in</a> | <a href=\"/register\">Register</a>"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> SessionUser {
        SessionUser {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<b>\"a&b\"</b>"),
            "&lt;b&gt;&quot;a&amp;b&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn entry_names_are_escaped_in_listing() {
        let entries = vec![EntryInfo {
            name: "<script>alert(1)</script>.txt".into(),
            is_directory: false,
            size: 10,
            last_modified: "2025-01-01".into(),
            rel_path: "<script>alert(1)</script>.txt".into(),
        }];
        let breadcrumb = vec![("Home".to_string(), String::new())];

        let html = index_page(&sample_user(), "", &entries, &breadcrumb, &[], "tok");
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn login_page_carries_csrf_token() {
        let html = login_page(&[], "token-123");
        assert!(html.contains("name=\"_csrf\" value=\"token-123\""));
    }

    #[test]
    fn flashes_are_rendered_by_kind() {
        let flashes = vec![
            Flash {
                kind: FlashKind::Error,
                text: "Invalid credentials".into(),
            },
            Flash {
                kind: FlashKind::Success,
                text: "Folder created successfully".into(),
            },
        ];
        let html = login_page(&flashes, "tok");
        assert!(html.contains("flash-error"));
        assert!(html.contains("Invalid credentials"));
        assert!(html.contains("flash-success"));
        assert!(html.contains("Folder created successfully"));
    }

    #[test]
    fn directories_link_to_listing_and_files_to_download() {
        let entries = vec![
            EntryInfo {
                name: "docs".into(),
                is_directory: true,
                size: 0,
                last_modified: "2025-01-01".into(),
                rel_path: "docs".into(),
            },
            EntryInfo {
                name: "a b.txt".into(),
                is_directory: false,
                size: 3,
                last_modified: "2025-01-01".into(),
                rel_path: "a b.txt".into(),
            },
        ];
        let breadcrumb = vec![("Home".to_string(), String::new())];

        let html = index_page(&sample_user(), "", &entries, &breadcrumb, &[], "tok");
        assert!(html.contains("/?path=docs"));
        assert!(html.contains("/download/a%20b%2Etxt"));
    }
}
