//! Router tests driven through `tower::ServiceExt::oneshot`

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use folio::{
    api::{build_router, AppState},
    cache::MemoryCache,
    config::Config,
    db::{create_test_pool, migrations::run_migrations},
    render::SiteTemplates,
    storage::LocalStorage,
    store::SqlxContentStore,
};

const TOKEN: &str = "test-token";

struct TestApp {
    router: Router,
    _uploads: tempfile::TempDir,
}

async fn app_with_token(token: Option<&str>) -> TestApp {
    let uploads = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.admin.token = token.map(str::to_string);
    config.storage.path = uploads.path().to_path_buf();
    config.storage.max_file_size = 1024;
    config.site.title = "Test Portfolio".to_string();

    let pool = create_test_pool().await.unwrap();
    run_migrations(&pool).await.unwrap();

    let state = AppState::new(
        &config,
        Arc::new(SqlxContentStore::new(pool)),
        Arc::new(MemoryCache::new(100, Duration::from_secs(60))),
        Arc::new(LocalStorage::new(uploads.path().to_path_buf(), "/uploads".to_string())),
        SiteTemplates::embedded().unwrap(),
    );

    TestApp {
        router: build_router(state, &config),
        _uploads: uploads,
    }
}

async fn app() -> TestApp {
    app_with_token(Some(TOKEN)).await
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn admin_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart(uri: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "folio-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: {ct}\r\n\r\n",
            b = boundary,
            f = filename,
            ct = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::post(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_home_page_renders_with_empty_store() {
    let app = app().await;
    let (status, body) = send(&app, get("/")).await;
    let html = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Test Portfolio"));
    assert!(html.contains("data-session=\""));
    assert!(html.contains("id=\"skills\""));
    assert!(html.contains("id=\"services\""));
    assert!(!html.contains("id=\"testimonials\""));
}

#[tokio::test]
async fn test_unknown_route_and_missing_post_are_404_pages() {
    let app = app().await;

    let (status, body) = send(&app, get("/blog/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8(body).unwrap().contains("Page not found"));

    let (status, _) = send(&app, get("/no/such/page")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_requires_token() {
    let app = app().await;

    let (status, body) = send_json(&app, get("/api/v1/admin/collections/skills")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let request = Request::get("/api/v1/admin/collections/skills")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(&app, admin_json("GET", "/api/v1/admin/collections/skills", Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_admin_disabled_without_token() {
    let app = app_with_token(None).await;
    let (status, body) = send_json(&app, admin_json("GET", "/api/v1/admin/collections/skills", Value::Null)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_admin_crud_round_trip() {
    let app = app().await;

    let (status, created) = send_json(
        &app,
        admin_json(
            "POST",
            "/api/v1/admin/collections/testimonials",
            json!({"author": "Ada", "quote": "Superb work"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["is_visible"], true);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, section) = send_json(&app, get("/api/v1/sections/testimonials")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(section["items"][0]["fields"]["quote"], "Superb work");

    let (status, updated) = send_json(
        &app,
        admin_json(
            "PUT",
            &format!("/api/v1/admin/collections/testimonials/{}", id),
            json!({"quote": "Even better"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["quote"], "Even better");

    let (_, section) = send_json(&app, get("/api/v1/sections/testimonials")).await;
    assert_eq!(section["items"][0]["fields"]["quote"], "Even better");

    let (status, _) = send(
        &app,
        admin_json("DELETE", &format!("/api/v1/admin/collections/testimonials/{}", id), Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, section) = send_json(&app, get("/api/v1/sections/testimonials")).await;
    assert_eq!(section, Value::Null);
}

#[tokio::test]
async fn test_admin_validation_errors() {
    let app = app().await;

    let (status, body) = send_json(
        &app,
        admin_json("POST", "/api/v1/admin/collections/skills", json!({"icon": "code"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send_json(
        &app,
        admin_json("POST", "/api/v1/admin/collections/users", json!({"name": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(
        &app,
        admin_json("PUT", "/api/v1/admin/collections/skills/missing", json!({"name": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_id_is_conflict() {
    let app = app().await;
    let row = json!({"id": "rust", "name": "Rust"});
    let (status, _) = send_json(&app, admin_json("POST", "/api/v1/admin/collections/skills", row.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(&app, admin_json("POST", "/api/v1/admin/collections/skills", row)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_duplicate_section_key_is_conflict() {
    let app = app().await;
    let uri = "/api/v1/admin/collections/section_visibility";
    let (status, _) = send_json(
        &app,
        admin_json("POST", uri, json!({"section_key": "blog", "is_visible": false})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        &app,
        admin_json("POST", uri, json!({"section_key": "blog", "is_visible": true})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, body) = send_json(&app, get("/api/v1/visibility/blog")).await;
    assert_eq!(body["is_visible"], false);
}

#[tokio::test]
async fn test_malformed_row_is_rejected() {
    let app = app().await;
    let (status, body) = send_json(
        &app,
        admin_json(
            "POST",
            "/api/v1/admin/collections/skills",
            json!({"name": "Rust", "display_order": "first"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send_json(&app, admin_json("GET", "/api/v1/admin/collections/skills", Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_visibility_endpoints() {
    let app = app().await;

    let (status, body) = send_json(&app, get("/api/v1/visibility/testimonials")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"section_key": "testimonials", "is_visible": true}));

    let (status, body) = send_json(
        &app,
        admin_json("PUT", "/api/v1/admin/visibility/skills", json!({"is_visible": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_visible"], false);

    let (_, body) = send_json(&app, get("/api/v1/visibility/skills")).await;
    assert_eq!(body["is_visible"], false);

    let (_, section) = send_json(&app, get("/api/v1/sections/skills")).await;
    assert_eq!(section, Value::Null);

    let (_, html) = send(&app, get("/")).await;
    assert!(!String::from_utf8(html).unwrap().contains("id=\"skills\""));
}

#[tokio::test]
async fn test_unknown_section_key_rejected() {
    let app = app().await;
    let (status, body) = send_json(&app, get("/api/v1/sections/guestbook")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send_json(&app, get("/api/v1/visibility/guestbook")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, get("/api/v1/sections/hero")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fallback_section_over_api() {
    let app = app().await;
    let (status, body) = send_json(&app, get("/api/v1/sections/services")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["used_fallback"], true);
    assert_eq!(body["items"][1]["position"], 1);
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send_json(&app, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_upload_and_serve() {
    let app = app().await;

    let (status, body) = send_json(
        &app,
        multipart("/api/v1/admin/upload?path=avatars/me.png", "me.png", "image/png", b"\x89PNG"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["url"], "/uploads/avatars/me.png");

    let (status, served) = send(&app, get("/uploads/avatars/me.png")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, b"\x89PNG");

    let (status, body) = send_json(
        &app,
        multipart("/api/v1/admin/upload?path=avatars/me.png", "me.png", "image/png", b"other"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = send_json(
        &app,
        multipart(
            "/api/v1/admin/upload?path=avatars/me.png&overwrite=true",
            "me.png",
            "image/png",
            b"other",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_upload_rejections() {
    let app = app().await;

    let (status, _) = send_json(&app, multipart("/api/v1/admin/upload", "a.txt", "text/plain", b"hi")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        multipart("/api/v1/admin/upload", "big.png", "image/png", &[0u8; 2048]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        multipart("/api/v1/admin/upload?path=../escape.png", "e.png", "image/png", b"x"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(&app, multipart("/api/v1/admin/upload", "a.png", "image/png", b"x")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["path"].as_str().unwrap().ends_with(".png"));
}
