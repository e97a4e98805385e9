//! Router harness for handler tests: in-memory store, media on a temp dir,
//! one seeded admin.

use axum::body::Body;
use axum::http::{header::COOKIE, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::HttpConfig;
use crate::db::{models::Admin, Store};
use crate::media::LocalDiskHost;
use crate::routes::auth::{issue_token, AuthConfig};
use crate::state::AppState;

pub const ADMIN_EMAIL: &str = "admin@sochlabs.com";
pub const ADMIN_PASSWORD: &str = "correct horse";

pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
pub const MP4: &[u8] = &[0, 0, 0, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm'];

const BOUNDARY: &str = "sochlabs-test-boundary";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub cookie: String,
    pub media_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let media_dir = tempfile::tempdir().unwrap();
        let store = Store::memory();
        let hash = bcrypt::hash(ADMIN_PASSWORD, 4).unwrap();
        let admin = store.admins.insert(Admin::new(ADMIN_EMAIL, hash)).await.unwrap();

        let auth = AuthConfig::new("test-secret", false);
        let token = issue_token(&auth, &admin).unwrap();
        let state = AppState::new(
            store,
            Arc::new(LocalDiskHost::new(media_dir.path(), "")),
            auth,
            "videos/slots",
        );
        let http = HttpConfig {
            addr: ([127, 0, 0, 1], 0).into(),
            allowed_origins: vec![],
            max_upload_bytes: 1024 * 1024,
            upload_dir: None,
        };

        Self {
            router: crate::create_app(state.clone(), &http),
            state,
            cookie: format!("token={}", token),
            media_dir,
        }
    }

    pub async fn raw(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.raw(req).await;
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    /// Same request with and without the admin cookie is the common case, so
    /// the cookie is opt-in here.
    pub fn authed(&self, mut req: Request<Body>) -> Request<Body> {
        req.headers_mut()
            .insert(COOKIE, self.cookie.parse().unwrap());
        req
    }
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// A file part for [`multipart_request`].
pub struct TestFile<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

pub fn image(field: &str) -> TestFile<'_> {
    TestFile {
        field,
        file_name: "upload.png",
        content_type: "image/png",
        bytes: PNG,
    }
}

pub fn multipart_request(
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    files: &[TestFile<'_>],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
