//! Server test utilities.

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use roster_core::config::{AppConfig, MetadataConfig, StorageConfig};
use roster_metadata::{MetadataStore, SqliteStore};
use roster_server::{AppState, create_router};
use roster_storage::{FilesystemBackend, ObjectStore};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "roster-test-boundary";

/// A raw response captured from the router.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    /// Parse the body as JSON, or `Null` if it is empty or not JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// The `name=value` part of the session cookie set by this response.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned)
    }
}

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub uploads_dir: PathBuf,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        Self::build(modifier, |store| store).await
    }

    /// Create a test server whose metadata store is wrapped by `wrap`.
    pub async fn with_metadata<W>(wrap: W) -> Self
    where
        W: FnOnce(Arc<dyn MetadataStore>) -> Arc<dyn MetadataStore>,
    {
        Self::build(|_| {}, wrap).await
    }

    async fn build<F, W>(modifier: F, wrap: W) -> Self
    where
        F: FnOnce(&mut AppConfig),
        W: FnOnce(Arc<dyn MetadataStore>) -> Arc<dyn MetadataStore>,
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let uploads_dir = temp_dir.path().join("uploads");
        let db_path = temp_dir.path().join("roster.db");

        let mut config = AppConfig::for_testing();
        config.storage = StorageConfig::Filesystem {
            path: uploads_dir.clone(),
        };
        config.metadata = MetadataConfig::Sqlite {
            path: db_path.clone(),
            max_connections: 1,
        };
        modifier(&mut config);

        let storage: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(&uploads_dir)
                .await
                .expect("Failed to create storage backend"),
        );
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path, 1)
                .await
                .expect("Failed to create metadata store"),
        );
        let metadata = wrap(metadata);

        let state = AppState::new(config, storage, metadata).expect("Invalid test config");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            uploads_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Make a request with an optional JSON body and session cookie.
    pub async fn json_request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };

        let response = self.send(builder.body(body).unwrap()).await;
        (response.status, response.json())
    }

    /// Sign up a user, returning the status.
    pub async fn signup(&self, name: &str, username: &str, password: &str) -> StatusCode {
        let (status, _) = self
            .json_request(
                "POST",
                "/signup",
                Some(serde_json::json!({
                    "name": name,
                    "username": username,
                    "password": password,
                })),
                None,
            )
            .await;
        status
    }

    /// Log in and return the raw login response.
    pub async fn login_response(&self, username: &str, password: &str) -> TestResponse {
        let body = serde_json::json!({ "username": username, "password": password });
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    /// Sign up and log in, returning the user ID and session cookie.
    pub async fn signup_and_login(&self, name: &str, username: &str) -> (String, String) {
        assert_eq!(self.signup(name, username, "pw").await, StatusCode::OK);
        let response = self.login_response(username, "pw").await;
        assert_eq!(response.status, StatusCode::OK);

        let id = response.json()["user"]
            .as_str()
            .expect("login response carries the user id")
            .to_string();
        let cookie = response.session_cookie().expect("login sets a session cookie");
        (id, cookie)
    }

    /// Upload a multipart body with one file part per `(filename, data)` entry.
    pub async fn upload_files(
        &self,
        user_id: &str,
        cookie: Option<&str>,
        files: &[(&str, &[u8])],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/upload/{user_id}"))
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }

        let response = self
            .send(builder.body(Body::from(multipart_body(files))).unwrap())
            .await;
        (response.status, response.json())
    }

    /// Upload a single file.
    pub async fn upload(
        &self,
        user_id: &str,
        cookie: &str,
        filename: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        self.upload_files(user_id, Some(cookie), &[(filename, data)])
            .await
    }

    /// Names of all files currently in the uploads directory.
    pub fn uploaded_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.uploads_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Build a multipart/form-data body with a text field and the given files.
pub fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\nhello\r\n"
        )
        .as_bytes(),
    );
    for (filename, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"profilePicture\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
