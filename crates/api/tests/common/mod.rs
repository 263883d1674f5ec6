#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use batchtone_core::upload::UploadLimits;
use batchtone_engine::blob::MemoryBlobStore;
use batchtone_engine::store::MemoryStore;
use batchtone_engine::Engine;
use http_body_util::BodyExt;
use tower::ServiceExt;

use batchtone_api::app;
use batchtone_api::auth::session::{SessionConfig, SessionIssuer};
use batchtone_api::config::ServerConfig;
use batchtone_api::state::AppState;

pub const BOUNDARY: &str = "batchtone-test-boundary";

/// Build a test `ServerConfig` with safe defaults and a fixed session
/// secret. No database: the app runs on the in-memory stores.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        blob_root: PathBuf::from("./blobs"),
        public_blob_base_url: "http://localhost:3000/blobs".to_string(),
        session: SessionConfig {
            secret: "test-session-secret".to_string(),
            expiry_days: 1,
        },
        limits: UploadLimits {
            max_images_per_batch: 3,
            max_file_size_bytes: 1024 * 1024,
        },
        stuck_processing_minutes: 10,
    }
}

/// Handles kept by tests that need to look behind the HTTP surface.
pub struct TestApp {
    pub router: Router,
    pub rows: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
}

/// Build the full application router on in-memory stores.
///
/// Goes through `app::build_router` so tests exercise the same middleware
/// stack (CORS, request ID, timeout, tracing, panic recovery) as production.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let rows = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let identity = Arc::new(SessionIssuer::new(config.session.clone()));
    let engine = Engine::new(rows.clone(), blobs.clone(), identity, config.limits);

    let state = AppState {
        engine,
        config: Arc::new(config),
        pool: None,
    };

    TestApp {
        router: app::build_router(state, None),
        rows,
        blobs,
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a JSON body with `method`.
pub async fn json_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// One file part of a multipart upload.
pub struct Part<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

pub fn jpeg(file_name: &str) -> Part<'_> {
    Part {
        file_name,
        content_type: "image/jpeg",
        bytes: b"\xff\xd8\xff\xe0fake-jpeg",
    }
}

/// Encode `parts` as a `multipart/form-data` body under the field `files`.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                part.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart upload, with a bearer token when `token` is set.
pub async fn upload(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    parts: &[Part<'_>],
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(multipart_body(parts))).unwrap();
    send(app, request).await
}

/// Start a batch anonymously and return `(token, batch_id, first_image_id)`.
pub async fn start_batch(app: &Router) -> (String, String, String) {
    let response = upload(app, "/api/v1/batches", None, &[jpeg("first.jpg")]).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];
    (
        data["session"]["token"].as_str().unwrap().to_string(),
        data["batch"]["id"].as_str().unwrap().to_string(),
        data["image"]["id"].as_str().unwrap().to_string(),
    )
}

/// The default vector as JSON, with `overrides` applied on top.
pub fn vector(overrides: serde_json::Value) -> serde_json::Value {
    let mut v = serde_json::json!({
        "brightness": 1.0,
        "contrast": 1.0,
        "saturation": 1.0,
        "tint": 0.0,
        "warmth": 0.0,
        "hue": 0.0,
        "blackPoint": 0.0,
    });
    if let (Some(base), Some(extra)) = (v.as_object_mut(), overrides.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    v
}
