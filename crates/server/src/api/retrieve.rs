//! Retrieval and metadata API handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use clipfetch_core::{
    janitor::ScopeGuard, Attempt, Budget, FailureKind, Guidance, InfoResult, Platform,
    RetrievalError, RetrievalFailure, RetrievalRequest, RetrievalResult, RetrievedMedia,
};

use super::handlers::bad_request;
use super::ErrorResponse;
use crate::state::AppState;

pub const HEADER_STRATEGY: &str = "x-strategy";
pub const HEADER_SIZE_BYTES: &str = "x-size-bytes";
pub const HEADER_MEDIA_TITLE: &str = "x-media-title";

// ============================================================================
// Request/Response types
// ============================================================================

/// Body of `POST /api/v1/retrieve`.
///
/// Limits may only be tightened; values above the configured budget are
/// clamped to it.
#[derive(Debug, Deserialize)]
pub struct RetrieveBody {
    pub url: String,
    pub scope_id: String,
    #[serde(default)]
    pub max_bytes: Option<u64>,
    #[serde(default)]
    pub per_attempt_timeout_secs: Option<u64>,
    #[serde(default)]
    pub overall_timeout_secs: Option<u64>,
}

impl RetrieveBody {
    fn budget(&self, defaults: Budget) -> Budget {
        let clamp = |requested: Option<u64>, limit: Duration| {
            requested.map_or(limit, |secs| Duration::from_secs(secs).min(limit))
        };
        Budget {
            max_bytes: self
                .max_bytes
                .map_or(defaults.max_bytes, |m| m.min(defaults.max_bytes)),
            per_attempt_timeout: clamp(self.per_attempt_timeout_secs, defaults.per_attempt_timeout),
            overall_timeout: clamp(self.overall_timeout_secs, defaults.overall_timeout),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RetrievalFailureResponse {
    pub kind: FailureKind,
    pub guidance: Guidance,
    pub platform: Platform,
    pub attempts: Vec<Attempt>,
}

impl From<RetrievalFailure> for RetrievalFailureResponse {
    fn from(failure: RetrievalFailure) -> Self {
        Self {
            kind: failure.kind,
            guidance: failure.kind.guidance(),
            platform: failure.platform,
            attempts: failure.attempts,
        }
    }
}

/// HTTP status for a failed retrieval.
pub fn failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::UnsupportedPlatform => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::MissingCredential | FailureKind::AuthRequired => StatusCode::UNAUTHORIZED,
        FailureKind::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::Backend => StatusCode::BAD_GATEWAY,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/retrieve
///
/// Runs the strategy chain. On success the media bytes are streamed back and
/// the artifact is released; on failure a JSON report is returned.
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RetrieveBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return bad_request(e.body_text()).into_response(),
    };

    let orchestrator = state.orchestrator();
    let budget = body.budget(orchestrator.default_budget());
    let request = match RetrievalRequest::new(body.url, body.scope_id, budget) {
        Ok(request) => request,
        Err(e) => return bad_request(e.to_string()).into_response(),
    };

    match orchestrator
        .retrieve_with_cancel(&request, state.request_token())
        .await
    {
        Ok(RetrievalResult::Success(media)) => deliver(&state, media).await,
        Ok(RetrievalResult::Failure(failure)) => {
            let status = failure_status(failure.kind);
            (status, Json(RetrievalFailureResponse::from(failure))).into_response()
        }
        Err(e) => retrieval_error_response(e),
    }
}

/// Body of `POST /api/v1/info`.
#[derive(Debug, Deserialize)]
pub struct InfoBody {
    pub url: String,
}

/// POST /api/v1/info
///
/// Metadata lookup without downloading. Failures use the same statuses and
/// report shape as retrieval.
pub async fn info(
    State(state): State<Arc<AppState>>,
    body: Result<Json<InfoBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return bad_request(e.body_text()).into_response(),
    };

    match state
        .orchestrator()
        .info_with_cancel(&body.url, state.request_token())
        .await
    {
        Ok(InfoResult::Found(report)) => Json(report).into_response(),
        Ok(InfoResult::Failure(failure)) => {
            let status = failure_status(failure.kind);
            (status, Json(RetrievalFailureResponse::from(failure))).into_response()
        }
        Err(e) => retrieval_error_response(e),
    }
}

/// Read the artifact into the response and hand it back to the janitor.
///
/// The scope stays guarded until released, so a dropped request still
/// removes the artifact.
async fn deliver(state: &AppState, media: RetrievedMedia) -> Response {
    let mut guard = ScopeGuard::for_dir(&media.scope_dir);
    let bytes = tokio::fs::read(&media.artifact_path).await;

    match state.orchestrator().release(&media).await {
        Ok(()) => guard.disarm(),
        Err(e) => warn!("Failed to release artifact {:?}: {}", media.artifact_path, e),
    }

    let bytes = match bytes {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read artifact {:?}: {}", media.artifact_path, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "retrieved artifact could not be read".to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut response = Response::new(Body::from(bytes));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Ok(value) = HeaderValue::from_str(&media.strategy_used) {
        headers.insert(HEADER_STRATEGY, value);
    }
    headers.insert(HEADER_SIZE_BYTES, HeaderValue::from(media.size_bytes));
    // Titles outside visible ASCII are not valid header values and are omitted.
    if let Ok(value) = HeaderValue::from_str(&media.title) {
        headers.insert(HEADER_MEDIA_TITLE, value);
    }
    response
}

fn retrieval_error_response(error: RetrievalError) -> Response {
    let status = match &error {
        RetrievalError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        RetrievalError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        RetrievalError::ScopeSetup { .. } => {
            error!("Retrieval environment error: {}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}
