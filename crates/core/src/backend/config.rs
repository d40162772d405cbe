//! Configuration for the yt-dlp backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the `yt-dlp` backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Directory or binary path passed as `--ffmpeg-location`.
    #[serde(default)]
    pub ffmpeg_location: Option<PathBuf>,

    /// Network socket timeout handed to the backend, in seconds.
    #[serde(default = "default_socket_timeout")]
    pub socket_timeout_secs: u64,

    /// Backend-internal retry count for the non-credentialed strategies.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Additional arguments appended before the URL.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_socket_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    1
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            ffmpeg_location: None,
            socket_timeout_secs: default_socket_timeout(),
            retries: default_retries(),
            extra_args: Vec::new(),
        }
    }
}

impl BackendConfig {
    /// Creates a config pointing at a specific yt-dlp binary.
    pub fn with_path(ytdlp_path: PathBuf) -> Self {
        Self {
            ytdlp_path,
            ..Default::default()
        }
    }

    /// Sets the ffmpeg location.
    pub fn with_ffmpeg_location(mut self, location: PathBuf) -> Self {
        self.ffmpeg_location = Some(location);
        self
    }

    /// Sets the socket timeout in seconds.
    pub fn with_socket_timeout(mut self, secs: u64) -> Self {
        self.socket_timeout_secs = secs;
        self
    }
}
