//! Common test utilities for API testing with a mock backend.
//!
//! This module provides a test fixture that builds the router in-process
//! with a [`MockBackend`] injected, so the full retrieval path can be
//! exercised without yt-dlp or network access.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use clipfetch_core::{
    strategy::StrategyOrderConfig,
    testing::MockBackend,
    Config, Orchestrator,
};

/// Re-export fixtures for test convenience
pub use clipfetch_core::testing::fixtures;

/// Test fixture for API testing with a mock backend.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_retrieve() {
///     let fixture = TestFixture::new();
///     fixture.backend.set_behavior(ClientProfile::MobileA, MockBehavior::succeed(64)).await;
///
///     let response = fixture.post("/api/v1/retrieve", json!({
///         "url": fixtures::YOUTUBE_URL,
///         "scope_id": "chat-1"
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock backend - script per-profile outcomes
    pub backend: MockBackend,
    /// Root under which scope directories are created
    pub temp_root: PathBuf,
    /// Token the server would cancel on shutdown
    pub shutdown: CancellationToken,
    /// Temporary directory holding the temp root and credentials
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default strategy order and no credentials.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let temp_root = temp_dir.path().join("scopes");
        let backend = MockBackend::new();

        let credential_path = if test_config.with_credentials {
            Some(fixtures::write_cookie_file(temp_dir.path()).expect("Failed to write cookies"))
        } else {
            None
        };

        let mut config = Config::default();
        config.server.host = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
        config.retrieval.temp_root = temp_root.clone();
        config.retrieval.credential_path = credential_path;
        config.retrieval.max_bytes = test_config.max_bytes;
        config.retrieval.per_attempt_timeout_secs = 5;
        config.retrieval.overall_timeout_secs = 20;
        config.strategies = test_config.strategies;

        let orchestrator = Arc::new(
            Orchestrator::from_config(&config, Arc::new(backend.clone()))
                .expect("Failed to build orchestrator"),
        );

        let shutdown = CancellationToken::new();
        let state = Arc::new(clipfetch_server::state::AppState::new(
            config,
            orchestrator,
            shutdown.clone(),
        ));
        let router = clipfetch_server::api::create_router(state);

        Self {
            router,
            backend,
            temp_root,
            shutdown,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// True if no scope directory or file is left under the temp root.
    pub fn temp_root_is_clean(&self) -> bool {
        match std::fs::read_dir(&self.temp_root) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Write a valid cookie file and configure it
    pub with_credentials: bool,
    pub max_bytes: u64,
    pub strategies: StrategyOrderConfig,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            with_credentials: false,
            max_bytes: 1024 * 1024,
            strategies: StrategyOrderConfig::default(),
        }
    }
}

impl TestConfig {
    /// Create config with a valid credential file.
    pub fn with_credentials() -> Self {
        Self {
            with_credentials: true,
            ..Self::default()
        }
    }
}
