//! Request, budget, and result types for retrieval.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::error::RetrievalError;
use crate::backend::MediaInfo;
use crate::platform::Platform;
use crate::strategy::Attempt;

/// Closed taxonomy of retrieval failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnsupportedPlatform,
    MissingCredential,
    AuthRequired,
    Timeout,
    TooLarge,
    Backend,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UnsupportedPlatform => "unsupported_platform",
            FailureKind::MissingCredential => "missing_credential",
            FailureKind::AuthRequired => "auth_required",
            FailureKind::Timeout => "timeout",
            FailureKind::TooLarge => "too_large",
            FailureKind::Backend => "backend",
        }
    }

    /// Whether the chain may move on to the next strategy after this failure.
    ///
    /// An oversized artifact is a property of the media, not of the client
    /// fingerprint, so no other strategy is tried.
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, FailureKind::TooLarge | FailureKind::UnsupportedPlatform)
    }

    /// Category the messaging layer should present to the user.
    pub fn guidance(&self) -> Guidance {
        match self {
            FailureKind::MissingCredential | FailureKind::AuthRequired => {
                Guidance::AuthenticationNeeded
            }
            FailureKind::TooLarge => Guidance::SizeLimit,
            FailureKind::Timeout | FailureKind::Backend => Guidance::RetryLater,
            FailureKind::UnsupportedPlatform => Guidance::Unsupported,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing category for a failure. Carries no text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guidance {
    AuthenticationNeeded,
    SizeLimit,
    RetryLater,
    Unsupported,
}

/// Size and time limits for a single retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub max_bytes: u64,
    pub per_attempt_timeout: Duration,
    pub overall_timeout: Duration,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
            per_attempt_timeout: Duration::from_secs(15),
            overall_timeout: Duration::from_secs(60),
        }
    }
}

impl Budget {
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_per_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.per_attempt_timeout = timeout;
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }
}

/// A validated retrieval request. Immutable once built.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    url: String,
    scope_id: String,
    budget: Budget,
}

impl RetrievalRequest {
    /// Build a request, rejecting empty identifiers and zero limits.
    pub fn new(
        url: impl Into<String>,
        scope_id: impl Into<String>,
        budget: Budget,
    ) -> Result<Self, RetrievalError> {
        let url = url.into().trim().to_string();
        let scope_id = scope_id.into();

        if url.is_empty() {
            return Err(RetrievalError::invalid_request("url must not be empty"));
        }
        if scope_id.trim().is_empty() {
            return Err(RetrievalError::invalid_request("scope_id must not be empty"));
        }
        if budget.max_bytes == 0 {
            return Err(RetrievalError::invalid_request("max_bytes must be positive"));
        }
        if budget.per_attempt_timeout.is_zero() || budget.overall_timeout.is_zero() {
            return Err(RetrievalError::invalid_request("timeouts must be positive"));
        }

        Ok(Self {
            url,
            scope_id,
            budget,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn max_bytes(&self) -> u64 {
        self.budget.max_bytes
    }
}

/// A media file handed off to the caller.
///
/// The artifact belongs to the caller from the moment this is returned. Pass
/// it back to `Orchestrator::release` once it has been delivered.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedMedia {
    pub artifact_path: PathBuf,
    pub size_bytes: u64,
    pub strategy_used: String,
    pub title: String,
    pub platform: Platform,
    /// Per-request directory holding the artifact.
    pub scope_dir: PathBuf,
    pub attempts: Vec<Attempt>,
}

/// All strategies failed, or none applied.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalFailure {
    pub kind: FailureKind,
    pub platform: Platform,
    pub attempts: Vec<Attempt>,
}

impl RetrievalFailure {
    pub fn attempts_tried(&self) -> usize {
        self.attempts.len()
    }
}

/// Metadata found for a URL.
#[derive(Debug, Clone, Serialize)]
pub struct MediaReport {
    pub info: MediaInfo,
    pub strategy_used: String,
    pub platform: Platform,
    /// Failed attempts that preceded the successful one.
    pub attempts: Vec<Attempt>,
}

/// Outcome of a metadata lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InfoResult {
    Found(MediaReport),
    Failure(RetrievalFailure),
}

/// Outcome of a retrieval. Failures are data, not errors.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrievalResult {
    Success(RetrievedMedia),
    Failure(RetrievalFailure),
}

impl RetrievalResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RetrievalResult::Success(_))
    }

    pub fn attempts(&self) -> &[Attempt] {
        match self {
            RetrievalResult::Success(media) => &media.attempts,
            RetrievalResult::Failure(failure) => &failure.attempts,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RetrievalResult::Success(_) => None,
            RetrievalResult::Failure(failure) => Some(failure.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_stops_fallback() {
        assert!(!FailureKind::TooLarge.allows_fallback());
        assert!(FailureKind::AuthRequired.allows_fallback());
        assert!(FailureKind::MissingCredential.allows_fallback());
        assert!(FailureKind::Timeout.allows_fallback());
        assert!(FailureKind::Backend.allows_fallback());
    }

    #[test]
    fn test_guidance_mapping() {
        assert_eq!(
            FailureKind::AuthRequired.guidance(),
            Guidance::AuthenticationNeeded
        );
        assert_eq!(
            FailureKind::MissingCredential.guidance(),
            Guidance::AuthenticationNeeded
        );
        assert_eq!(FailureKind::TooLarge.guidance(), Guidance::SizeLimit);
        assert_eq!(FailureKind::Backend.guidance(), Guidance::RetryLater);
        assert_eq!(FailureKind::Timeout.guidance(), Guidance::RetryLater);
        assert_eq!(
            FailureKind::UnsupportedPlatform.guidance(),
            Guidance::Unsupported
        );
    }

    #[test]
    fn test_failure_kind_serialization() {
        let json = serde_json::to_string(&FailureKind::MissingCredential).unwrap();
        assert_eq!(json, "\"missing_credential\"");
        assert_eq!(FailureKind::TooLarge.to_string(), "too_large");
    }

    #[test]
    fn test_request_validation() {
        let budget = Budget::default();
        assert!(RetrievalRequest::new("https://youtu.be/x", "chat-1", budget).is_ok());
        assert!(RetrievalRequest::new("  ", "chat-1", budget).is_err());
        assert!(RetrievalRequest::new("https://youtu.be/x", "", budget).is_err());
        assert!(
            RetrievalRequest::new("https://youtu.be/x", "chat-1", budget.with_max_bytes(0))
                .is_err()
        );
        assert!(RetrievalRequest::new(
            "https://youtu.be/x",
            "chat-1",
            budget.with_per_attempt_timeout(Duration::ZERO)
        )
        .is_err());
    }

    #[test]
    fn test_request_trims_url() {
        let request =
            RetrievalRequest::new(" https://youtu.be/x \n", "42", Budget::default()).unwrap();
        assert_eq!(request.url(), "https://youtu.be/x");
        assert_eq!(request.scope_id(), "42");
        assert_eq!(request.max_bytes(), 50 * 1024 * 1024);
    }
}
