use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use clipfetch_core::{find_supported_url, Platform, SanitizedConfig, StrategySpec};

use super::ErrorResponse;
use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

#[derive(Debug, Serialize)]
pub struct PlatformStrategies {
    pub platform: Platform,
    pub strategies: Vec<StrategySpec>,
}

#[derive(Debug, Serialize)]
pub struct StrategiesResponse {
    pub platforms: Vec<PlatformStrategies>,
}

/// GET /api/v1/strategies
///
/// Ordered strategy list per supported platform.
pub async fn list_strategies(State(state): State<Arc<AppState>>) -> Json<StrategiesResponse> {
    let orchestrator = state.orchestrator();
    let platforms = Platform::SUPPORTED
        .iter()
        .map(|&platform| PlatformStrategies {
            platform,
            strategies: orchestrator.strategies_for(platform).to_vec(),
        })
        .collect();
    Json(StrategiesResponse { platforms })
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// Free text, e.g. a chat message, to search for a supported URL.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub platform: Platform,
    pub url: Option<String>,
}

/// POST /api/v1/detect
pub async fn detect(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DetectRequest>, JsonRejection>,
) -> Result<Json<DetectResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(body) = body.map_err(|e| bad_request(e.body_text()))?;

    let response = match (body.url, body.text) {
        (Some(url), _) => DetectResponse {
            platform: state.orchestrator().detect(&url),
            url: Some(url.trim().to_string()),
        },
        (None, Some(text)) => match find_supported_url(&text) {
            Some(found) => DetectResponse {
                platform: found.platform,
                url: Some(found.url),
            },
            None => DetectResponse {
                platform: Platform::Unsupported,
                url: None,
            },
        },
        (None, None) => return Err(bad_request("either url or text is required".to_string())),
    };
    Ok(Json(response))
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

pub(crate) fn bad_request(error: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}
