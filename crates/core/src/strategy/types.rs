use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::retrieval::FailureKind;

/// Client fingerprint a strategy presents to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientProfile {
    /// Backend defaults; used with the credential file.
    None,
    /// Android music client.
    MobileA,
    /// iOS client.
    MobileB,
    /// Desktop browser headers.
    GeneralWeb,
    /// Lowest quality, fewest options.
    Minimal,
}

impl ClientProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientProfile::None => "none",
            ClientProfile::MobileA => "mobile_a",
            ClientProfile::MobileB => "mobile_b",
            ClientProfile::GeneralWeb => "general_web",
            ClientProfile::Minimal => "minimal",
        }
    }
}

impl fmt::Display for ClientProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one retrieval attempt variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub name: String,
    pub requires_credential_file: bool,
    pub client_profile: ClientProfile,
    pub uses_post_processing: bool,
}

impl StrategySpec {
    pub fn new(name: impl Into<String>, client_profile: ClientProfile) -> Self {
        Self {
            name: name.into(),
            requires_credential_file: false,
            client_profile,
            uses_post_processing: false,
        }
    }

    pub fn with_credential_file(mut self) -> Self {
        self.requires_credential_file = true;
        self
    }

    pub fn with_post_processing(mut self) -> Self {
        self.uses_post_processing = true;
        self
    }
}

/// What a single strategy execution produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success {
        artifact_path: PathBuf,
        size_bytes: u64,
        title: Option<String>,
    },
    Failure {
        kind: FailureKind,
        detail: String,
    },
}

/// Record of one strategy execution. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub strategy: String,
    pub outcome: AttemptOutcome,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub started_at: DateTime<Utc>,
}

impl Attempt {
    pub fn failure(
        strategy: impl Into<String>,
        kind: FailureKind,
        detail: impl Into<String>,
        duration: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            strategy: strategy.into(),
            outcome: AttemptOutcome::Failure {
                kind,
                detail: detail.into(),
            },
            duration,
            started_at,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self.outcome {
            AttemptOutcome::Failure { kind, .. } => Some(kind),
            AttemptOutcome::Success { .. } => None,
        }
    }

    /// Label used for metrics and logs.
    pub fn outcome_label(&self) -> &'static str {
        match self.outcome {
            AttemptOutcome::Success { .. } => "success",
            AttemptOutcome::Failure { kind, .. } => kind.as_str(),
        }
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
