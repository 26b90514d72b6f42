//! Common test utilities for integration tests
//!
//! - In-memory repositories behind the real router
//! - A stub image uploader that counts calls and can be made to fail
//! - Users with session tokens
//! - Request builders, including multipart bodies

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use eventhub_api::{
    app::{build_router, AppState},
    config::Config,
    upload::{ImageUploader, UploadError},
};
use eventhub_shared::{
    auth::password::hash_password,
    memory::MemoryStore,
    models::user::{CreateUser, Role, User},
    repository::UserStore,
};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};
use tower::Service as _;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Uploader that never leaves the process
#[derive(Default)]
pub struct StubUploader {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl StubUploader {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageUploader for StubUploader {
    async fn upload(&self, _bytes: Bytes, _content_type: &str) -> Result<String, UploadError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if self.failing.load(Ordering::SeqCst) {
            return Err(UploadError::Rejected {
                status: 500,
                message: "stub failure".to_string(),
            });
        }

        Ok(format!("https://img.test/banners/{}.png", n))
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub uploader: Arc<StubUploader>,
}

pub fn test_config() -> Config {
    let vars = HashMap::from([
        ("DATABASE_URL", "postgresql://unused/eventhub"),
        ("JWT_SECRET", "integration-test-secret-at-least-32-bytes"),
        ("CLOUDINARY_CLOUD_NAME", "test"),
        ("CLOUDINARY_API_KEY", "key"),
        ("CLOUDINARY_API_SECRET", "secret"),
        ("UPLOAD_MAX_BYTES", "4096"),
    ]);

    Config::from_vars(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let uploader = Arc::new(StubUploader::default());

        let state = AppState::new(store.repositories(), uploader.clone(), test_config()).unwrap();
        let app = build_router(state.clone());

        Self {
            app,
            state,
            store,
            uploader,
        }
    }

    /// Creates a user directly in storage and returns it with a valid token
    pub async fn user(&self, email: &str, role: Role) -> (User, String) {
        let user = self
            .store
            .insert(CreateUser {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password_hash: hash_password(TEST_PASSWORD).unwrap(),
                role,
            })
            .await
            .unwrap();

        let token = self.state.tokens.issue(user.id, role).unwrap();
        (user, token)
    }

    /// Sends a request and returns the status and JSON body (`Null` if empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                panic!("non-JSON body ({}): {}", status, String::from_utf8_lossy(&body))
            })
        };

        (status, json)
    }

    /// Creates an event through the API as `token`'s owner
    pub async fn create_event(&self, token: &str, title: &str) -> Value {
        let form = MultipartBody::new()
            .text("title", title)
            .text("description", "An evening of talks")
            .text("location", "Main hall")
            .text("price", "10")
            .file("banner", "image/png", b"\x89PNG banner");

        let (status, body) = self
            .send(multipart_request(Method::POST, "/v1/events", Some(token), form))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create event failed: {}", body);
        body
    }
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    form: MultipartBody,
) -> Request<Body> {
    let content_type = form.content_type();
    with_auth(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(form.finish()))
        .unwrap()
}

/// Hand-built `multipart/form-data` body
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "eventhub-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"upload\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}
