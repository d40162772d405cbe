//! API tests for detection and retrieval endpoints.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use clipfetch_core::{strategy::StrategyOrderConfig, testing::MockBehavior, ClientProfile, Platform};
use common::{fixtures, TestConfig, TestFixture};

// =============================================================================
// Service endpoints
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_credential_path() {
    let fixture = TestFixture::with_config(TestConfig::with_credentials());
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["retrieval"]["credential_configured"], true);
    assert_eq!(response.body["retrieval"]["max_bytes"], 1024 * 1024);
    assert!(!response.body.to_string().contains("cookies.txt"));
}

#[tokio::test]
async fn test_strategies_lists_configured_order() {
    let fixture = TestFixture::with_config(TestConfig {
        strategies: StrategyOrderConfig::default().with_order(Platform::TikTok, &["minimal"]),
        ..TestConfig::default()
    });
    let response = fixture.get("/api/v1/strategies").await;

    assert_eq!(response.status, StatusCode::OK);
    let platforms = response.body["platforms"].as_array().unwrap();
    assert_eq!(platforms.len(), 3);

    let youtube = &platforms[0];
    assert_eq!(youtube["platform"], "youtube");
    assert_eq!(youtube["strategies"][0]["name"], "cookies");
    assert_eq!(youtube["strategies"][0]["requires_credential_file"], true);

    let tiktok = &platforms[2];
    assert_eq!(tiktok["platform"], "tiktok");
    assert_eq!(tiktok["strategies"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    let text = String::from_utf8(response.bytes.to_vec()).unwrap();
    assert!(text.contains("clipfetch_http_requests_total"));
}

// =============================================================================
// Detection
// =============================================================================

#[tokio::test]
async fn test_detect_url() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/v1/detect", json!({ "url": fixtures::TIKTOK_URL }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["platform"], "tiktok");
}

#[tokio::test]
async fn test_detect_from_text() {
    let fixture = TestFixture::new();
    let text = format!("look at this {} so funny", fixtures::INSTAGRAM_URL);
    let response = fixture.post("/api/v1/detect", json!({ "text": text })).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["platform"], "instagram");
    assert_eq!(response.body["url"], fixtures::INSTAGRAM_URL);
}

#[tokio::test]
async fn test_detect_text_without_url() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/v1/detect", json!({ "text": "no links here" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["platform"], "unsupported");
    assert!(response.body["url"].is_null());
}

#[tokio::test]
async fn test_detect_requires_input() {
    let fixture = TestFixture::new();
    let response = fixture.post("/api/v1/detect", json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

// =============================================================================
// Retrieval
// =============================================================================

#[tokio::test]
async fn test_retrieve_success_returns_bytes_and_releases() {
    let fixture = TestFixture::new();
    fixture
        .backend
        .set_behavior(ClientProfile::MobileA, MockBehavior::succeed_titled(64, "Short clip"))
        .await;

    let response = fixture
        .post(
            "/api/v1/retrieve",
            json!({ "url": fixtures::YOUTUBE_URL, "scope_id": "chat-1" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.bytes.len(), 64);
    assert_eq!(response.headers["x-strategy"], "android");
    assert_eq!(response.headers["x-size-bytes"], "64");
    assert_eq!(response.headers["x-media-title"], "Short clip");
    assert_eq!(response.headers["content-type"], "application/octet-stream");
    assert!(fixture.temp_root_is_clean());
}

#[tokio::test]
async fn test_retrieve_unsupported_is_422() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/v1/retrieve",
            json!({ "url": fixtures::UNSUPPORTED_URL, "scope_id": "chat-1" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["kind"], "unsupported_platform");
    assert_eq!(response.body["guidance"], "unsupported");
    assert_eq!(response.body["attempts"].as_array().unwrap().len(), 0);
    assert_eq!(fixture.backend.invocation_count().await, 0);
}

#[tokio::test]
async fn test_retrieve_too_large_is_413() {
    let fixture = TestFixture::new();
    fixture
        .backend
        .set_behavior(ClientProfile::MobileA, MockBehavior::succeed(2048))
        .await;

    let response = fixture
        .post(
            "/api/v1/retrieve",
            json!({ "url": fixtures::YOUTUBE_URL, "scope_id": "chat-2", "max_bytes": 1024 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["kind"], "too_large");
    assert_eq!(response.body["guidance"], "size_limit");
    assert!(fixture.temp_root_is_clean());
}

#[tokio::test]
async fn test_retrieve_auth_failure_is_401() {
    let fixture = TestFixture::with_config(TestConfig {
        strategies: StrategyOrderConfig::default().with_order(Platform::Instagram, &["web"]),
        ..TestConfig::default()
    });
    fixture
        .backend
        .set_behavior(
            ClientProfile::GeneralWeb,
            MockBehavior::fail("ERROR: [instagram] C1a2B3c4D5e: login required to view this post"),
        )
        .await;

    let response = fixture
        .post(
            "/api/v1/retrieve",
            json!({ "url": fixtures::INSTAGRAM_URL, "scope_id": "chat-3" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["kind"], "auth_required");
    let attempts = response.body["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["strategy"], "web");
}

#[tokio::test]
async fn test_retrieve_backend_failure_is_502() {
    let fixture = TestFixture::new();
    fixture
        .backend
        .set_default_behavior(MockBehavior::fail("ERROR: Unable to extract video data"))
        .await;

    let response = fixture
        .post(
            "/api/v1/retrieve",
            json!({ "url": fixtures::YOUTUBE_URL, "scope_id": "chat-4" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["kind"], "backend");
    assert_eq!(response.body["attempts"].as_array().unwrap().len(), 5);
    assert!(fixture.temp_root_is_clean());
}

#[tokio::test]
async fn test_retrieve_timeout_is_504() {
    let fixture = TestFixture::with_config(TestConfig {
        strategies: StrategyOrderConfig::default().with_order(Platform::YouTube, &["web"]),
        ..TestConfig::default()
    });
    fixture.backend.set_default_behavior(MockBehavior::Hang).await;

    let response = fixture
        .post(
            "/api/v1/retrieve",
            json!({
                "url": fixtures::YOUTUBE_URL,
                "scope_id": "chat-5",
                "per_attempt_timeout_secs": 1,
                "overall_timeout_secs": 1
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(response.body["kind"], "timeout");
    assert_eq!(response.body["guidance"], "retry_later");
}

#[tokio::test]
async fn test_retrieve_cancelled_on_shutdown() {
    let fixture = TestFixture::new();
    fixture.backend.set_default_behavior(MockBehavior::Hang).await;
    fixture.shutdown.cancel();

    let response = fixture
        .post(
            "/api/v1/retrieve",
            json!({ "url": fixtures::YOUTUBE_URL, "scope_id": "chat-6" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(fixture.temp_root_is_clean());
}

#[tokio::test]
async fn test_retrieve_invalid_input_is_400() {
    let fixture = TestFixture::new();

    let empty_scope = fixture
        .post(
            "/api/v1/retrieve",
            json!({ "url": fixtures::YOUTUBE_URL, "scope_id": "  " }),
        )
        .await;
    assert_eq!(empty_scope.status, StatusCode::BAD_REQUEST);

    let zero_limit = fixture
        .post(
            "/api/v1/retrieve",
            json!({ "url": fixtures::YOUTUBE_URL, "scope_id": "x", "max_bytes": 0 }),
        )
        .await;
    assert_eq!(zero_limit.status, StatusCode::BAD_REQUEST);

    let missing_field = fixture
        .post("/api/v1/retrieve", json!({ "url": fixtures::YOUTUBE_URL }))
        .await;
    assert_eq!(missing_field.status, StatusCode::BAD_REQUEST);

    let malformed = fixture.post_raw("/api/v1/retrieve", "{not json").await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    assert_eq!(fixture.backend.invocation_count().await, 0);
}

// =============================================================================
// Metadata lookup
// =============================================================================

#[tokio::test]
async fn test_info_returns_metadata_without_download() {
    let fixture = TestFixture::new();
    fixture
        .backend
        .set_behavior(
            ClientProfile::GeneralWeb,
            MockBehavior::succeed_titled(64, "Morning Reel"),
        )
        .await;

    let response = fixture
        .post("/api/v1/info", json!({ "url": fixtures::INSTAGRAM_URL }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["platform"], "instagram");
    assert_eq!(response.body["strategy_used"], "web");
    assert_eq!(response.body["info"]["title"], "Morning Reel");
    let attempts = response.body["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["strategy"], "cookies");

    assert_eq!(fixture.backend.invocation_count().await, 0);
    assert!(fixture.temp_root_is_clean());
}

#[tokio::test]
async fn test_info_failures_use_retrieval_statuses() {
    let fixture = TestFixture::new();

    let unsupported = fixture
        .post("/api/v1/info", json!({ "url": fixtures::UNSUPPORTED_URL }))
        .await;
    assert_eq!(unsupported.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(unsupported.body["kind"], "unsupported_platform");

    fixture
        .backend
        .set_default_behavior(MockBehavior::fail("ERROR: Unable to extract video data"))
        .await;
    let failed = fixture
        .post("/api/v1/info", json!({ "url": fixtures::TIKTOK_URL }))
        .await;
    assert_eq!(failed.status, StatusCode::BAD_GATEWAY);
    assert_eq!(failed.body["kind"], "backend");
    assert_eq!(failed.body["attempts"].as_array().unwrap().len(), 3);

    let missing = fixture.post("/api/v1/info", json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}
