//! End-to-end checks through the full router: in-memory store, local media
//! host in a temp dir, admin logged in over HTTP.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use sochlabs_backend::config::{AdminPassword, AdminSeed, HttpConfig};
use sochlabs_backend::db::{bootstrap_admin, BootstrapOutcome, Store};
use sochlabs_backend::media::LocalDiskHost;
use sochlabs_backend::routes::auth::AuthConfig;
use sochlabs_backend::state::AppState;

const EMAIL: &str = "studio@sochlabs.com";
const PASSWORD: &str = "integration-pass";
const BOUNDARY: &str = "api-test-boundary";
const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
const MP4: &[u8] = &[0, 0, 0, 0x18, b'f', b't', b'y', b'p', b'm', b'p', b'4', b'2'];

struct Harness {
    router: Router,
    store: Store,
    cookie: String,
    _media: TempDir,
}

impl Harness {
    async fn start() -> Self {
        let media = tempfile::tempdir().unwrap();
        let store = Store::memory();
        let seed = AdminSeed {
            email: EMAIL.to_string(),
            password: AdminPassword::Hashed(bcrypt::hash(PASSWORD, 4).unwrap()),
        };
        assert!(matches!(
            bootstrap_admin(&store, &seed).await.unwrap(),
            BootstrapOutcome::Created(_)
        ));

        let state = AppState::new(
            store.clone(),
            Arc::new(LocalDiskHost::new(media.path(), "http://localhost:3001")),
            AuthConfig::new("integration-secret", false),
            "videos/slots",
        );
        let http = HttpConfig {
            addr: ([127, 0, 0, 1], 0).into(),
            allowed_origins: vec!["http://localhost:3000".parse().unwrap()],
            max_upload_bytes: 64 * 1024,
            upload_dir: Some(media.path().to_path_buf()),
        };
        let router = sochlabs_backend::create_app(state, &http);

        let mut harness = Self {
            router,
            store,
            cookie: String::new(),
            _media: media,
        };
        harness.cookie = harness.login().await;
        harness
    }

    async fn login(&self) -> String {
        let req = Request::post("/api/admin/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"email": EMAIL, "password": PASSWORD}).to_string(),
            ))
            .unwrap();
        let res = self.router.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let set_cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn admin(&self, mut req: Request<Body>) -> (StatusCode, Value) {
        req.headers_mut()
            .insert(header::COOKIE, self.cookie.parse().unwrap());
        self.send(req).await
    }
}

fn multipart(
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, content_type, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{name}.bin\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn slot_type_always_follows_slot_number() {
    let app = Harness::start().await;
    for n in 1..=8 {
        let req = multipart(
            "PUT",
            &format!("/api/admin/videos/{n}"),
            &[("title", "clip"), ("type", if n <= 4 { "landscape" } else { "portrait" })],
            &[],
        );
        let (status, body) = app.admin(req).await;
        assert_eq!(status, StatusCode::OK);
        let expected = if n <= 4 { "portrait" } else { "landscape" };
        assert_eq!(body["slot"]["type"], expected, "slot {n}");
    }

    let (_, list) = app.get("/api/videos").await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 8);
    for (i, slot) in list.iter().enumerate() {
        assert_eq!(slot["slotId"], i as i64 + 1);
    }
}

#[tokio::test]
async fn first_write_to_slot_creates_it() {
    let app = Harness::start().await;
    let req = multipart(
        "PUT",
        "/api/admin/videos/5",
        &[("title", "Showreel"), ("isLive", "true")],
        &[("video", "video/mp4", MP4), ("thumbnail", "image/png", PNG)],
    );
    let (status, body) = app.admin(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let slot = &body["slot"];
    assert_eq!(slot["views"], 0);
    assert_eq!(slot["type"], "landscape");
    assert_eq!(
        slot["videoUrl"],
        "http://localhost:3001/uploads/videos/slots/slot_5.mp4"
    );
    assert_eq!(
        slot["thumbnailUrl"],
        "http://localhost:3001/uploads/videos/slots/slot_5_thumb.png"
    );

    let stored = app.get("/uploads/videos/slots/slot_5.mp4").await;
    assert_eq!(stored.0, StatusCode::OK);
}

#[tokio::test]
async fn out_of_range_slot_changes_nothing() {
    let app = Harness::start().await;
    for n in ["0", "9"] {
        let req = multipart(
            "PUT",
            &format!("/api/admin/videos/{n}"),
            &[("title", "nope")],
            &[("video", "video/mp4", MP4)],
        );
        let (status, _) = app.admin(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert!(app.store.videos.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_unknown_id_is_not_found_everywhere() {
    let app = Harness::start().await;
    let req = multipart(
        "POST",
        "/api/gallery",
        &[("title", "Poster")],
        &[("image", "image/png", PNG)],
    );
    assert_eq!(app.admin(req).await.0, StatusCode::CREATED);

    let missing = uuid::Uuid::new_v4();
    for base in [
        "/api/gallery",
        "/api/blog",
        "/api/clientproject",
        "/api/testimonial",
        "/api/projects",
    ] {
        let req = Request::delete(format!("{base}/{missing}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.admin(req).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{base}");
    }
    assert_eq!(app.store.gallery.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn testimonial_patch_touches_only_given_field() {
    let app = Harness::start().await;
    let req = multipart(
        "POST",
        "/api/testimonial",
        &[
            ("userName", "Ravi"),
            ("designation", "Founder"),
            ("headline", "old"),
            ("description", "Five stars"),
        ],
        &[("image", "image/png", PNG)],
    );
    let (status, created) = app.admin(req).await;
    assert_eq!(status, StatusCode::CREATED);
    let before = created["data"].clone();

    let req = Request::patch(format!("/api/testimonial/{}", before["id"].as_str().unwrap()))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"headline": "new"}).to_string()))
        .unwrap();
    let (status, body) = app.admin(req).await;
    assert_eq!(status, StatusCode::OK);
    let after = &body["data"];
    assert_eq!(after["headline"], "new");
    for field in ["userName", "designation", "description", "profilePictureURL"] {
        assert_eq!(after[field], before[field], "{field}");
    }
}

#[tokio::test]
async fn gallery_update_without_image_keeps_url() {
    let app = Harness::start().await;
    let req = multipart(
        "POST",
        "/api/gallery",
        &[("title", "Poster"), ("description", "v1")],
        &[("image", "image/png", PNG)],
    );
    let (_, created) = app.admin(req).await;

    let req = multipart(
        "PATCH",
        &format!("/api/gallery/{}", created["id"].as_str().unwrap()),
        &[("description", "v2")],
        &[],
    );
    let (status, body) = app.admin(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "v2");
    assert_eq!(body["data"]["imageURL"], created["imageURL"]);
}

#[tokio::test]
async fn admin_routes_reject_missing_cookie() {
    let app = Harness::start().await;
    let req = multipart("PUT", "/api/admin/videos/1", &[("title", "x")], &[]);
    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "Forbidden"}));
    assert!(app.store.videos.list().await.unwrap().is_empty());

    let req = Request::post("/api/logout").body(Body::empty()).unwrap();
    assert_eq!(app.send(req).await.0, StatusCode::OK);
    let req = Request::get("/api/admin/me")
        .header(header::COOKIE, "token=not-a-jwt")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(req).await.0, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn project_tags_round_trip() {
    let app = Harness::start().await;
    let req = multipart(
        "POST",
        "/api/projects",
        &[
            ("title", "Packaging"),
            ("category", "Print"),
            ("description", "Box design"),
            ("status", "Live"),
            ("tags", "a, b, c"),
        ],
        &[("image", "image/png", PNG)],
    );
    let (status, created) = app.admin(req).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .get(&format!("/api/projects/{}", created["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tags"], json!(["a", "b", "c"]));
}

#[tokio::test]
async fn list_endpoints_use_dashboard_envelopes() {
    let app = Harness::start().await;
    let req = multipart(
        "POST",
        "/api/gallery",
        &[("title", "Poster")],
        &[("image", "image/png", PNG)],
    );
    assert_eq!(app.admin(req).await.0, StatusCode::CREATED);

    for (uri, key, len) in [
        ("/api/gallery", "gallery", 1),
        ("/api/blog", "response", 0),
        ("/api/clientproject", "data", 0),
        ("/api/testimonial", "testimonials", 0),
        ("/api/projects", "data", 0),
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body[key].as_array().map(Vec::len), Some(len), "{uri}");
    }
    assert_eq!(app.get("/api/projects").await.1["success"], true);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = Harness::start().await;
    let mut big = PNG.to_vec();
    big.resize(128 * 1024, 0);
    let req = multipart(
        "POST",
        "/api/gallery",
        &[("title", "Huge")],
        &[("image", "image/png", &big)],
    );
    let (status, _) = app.admin(req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.store.gallery.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
    let app = Harness::start().await;
    let seed = AdminSeed {
        email: EMAIL.to_uppercase(),
        password: AdminPassword::Plain("other".to_string()),
    };
    assert_eq!(
        bootstrap_admin(&app.store, &seed).await.unwrap(),
        BootstrapOutcome::AlreadyPresent
    );
    // The original password still works.
    app.login().await;
}
