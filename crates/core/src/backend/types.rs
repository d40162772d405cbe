//! Invocation and output types for the media backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::platform::Platform;
use crate::strategy::ClientProfile;

/// Everything the backend needs for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendInvocation {
    pub url: String,
    pub platform: Platform,
    pub profile: ClientProfile,
    /// Validated credential file, only set for credentialed strategies.
    pub credential_path: Option<PathBuf>,
    /// Per-request scope directory. The backend must write only here.
    pub output_dir: PathBuf,
    /// Ask the backend to remux/recode into a widely playable container.
    pub post_process: bool,
    pub max_bytes: u64,
}

/// What the backend reports after a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOutput {
    /// Final media file, if the backend produced one.
    pub artifact: Option<PathBuf>,
    pub title: Option<String>,
}

/// A metadata lookup. Nothing is written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeInvocation {
    pub url: String,
    pub platform: Platform,
    pub profile: ClientProfile,
    pub credential_path: Option<PathBuf>,
}

/// Metadata reported by a probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Length in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
}
