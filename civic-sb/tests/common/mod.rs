//! Shared helpers for civic-sb integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use civic_common::api::Role;
use civic_common::config::UploadConfig;
use civic_common::db::init_memory_database;
use civic_sb::services::{JwtIdentityProvider, MemoryBlobStore};
use civic_sb::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`

pub const BOUNDARY: &str = "civic-test-boundary";

/// Router over an in-memory database and blob store
pub struct TestApp {
    pub app: Router,
    pub db: SqlitePool,
    pub blobs: Arc<MemoryBlobStore>,
    pub tokens: JwtIdentityProvider,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_limits(UploadConfig::default()).await
    }

    pub async fn with_limits(uploads: UploadConfig) -> Self {
        let db = init_memory_database().await.expect("in-memory database");
        let blobs = Arc::new(MemoryBlobStore::new());
        let tokens = JwtIdentityProvider::new("integration-secret", "civic");

        let state = AppState::new(
            db.clone(),
            Arc::new(tokens.clone()),
            blobs.clone(),
            uploads,
            PathBuf::from("target/nonexistent-uploads"),
        );

        Self {
            app: build_router(state),
            db,
            blobs,
            tokens,
        }
    }

    pub fn token(&self, subject: &str, role: Role) -> String {
        self.tokens.issue(subject, role, 3600).expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.expect("router response")
    }

    /// Send and decode a JSON response body (Null for empty bodies)
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        (status, json_body(response.into_body()).await)
    }

    /// Create a department through the admin API and return its JSON
    pub async fn create_department(&self, name: &str) -> Value {
        let admin = self.token("admin-1", Role::Admin);
        let (status, body) = self
            .call(json_request(
                "POST",
                "/admin/departments",
                Some(&admin),
                serde_json::json!({ "name": name }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create department: {}", body);
        body
    }

    /// Submit a suggestion and return its JSON
    pub async fn submit(&self, form: Multipart, token: Option<&str>) -> (StatusCode, Value) {
        self.call(form.into_request("/suggestions", token)).await
    }

    pub async fn suggestion_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM suggestions")
            .fetch_one(&self.db)
            .await
            .expect("count")
    }
}

pub async fn json_body(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

pub fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Hand-built `multipart/form-data` body
#[derive(Default)]
pub struct Multipart {
    buf: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anonymous submission with the given category and description
    pub fn suggestion(category: &str, description: &str) -> Self {
        Self::new()
            .text("category", category)
            .text("description", description)
            .text("anonymous", "true")
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str, token: Option<&str>) -> Request<Body> {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(self.buf)).unwrap()
    }
}
