use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::backend::BackendConfig;
use crate::janitor::JanitorConfig;
use crate::retrieval::RetrievalConfig;
use crate::strategy::StrategyOrderConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub strategies: StrategyOrderConfig,
    #[serde(default)]
    pub janitor: JanitorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Sanitized config for API responses (credential location hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub retrieval: SanitizedRetrievalConfig,
    pub backend: SanitizedBackendConfig,
    pub strategies: StrategyOrderConfig,
    pub janitor: JanitorConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRetrievalConfig {
    pub temp_root: PathBuf,
    pub credential_configured: bool,
    pub max_bytes: u64,
    pub per_attempt_timeout_secs: u64,
    pub overall_timeout_secs: u64,
}

/// Extra arguments may carry proxies or tokens, so only their count is shown.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBackendConfig {
    pub ytdlp_path: PathBuf,
    pub ffmpeg_configured: bool,
    pub socket_timeout_secs: u64,
    pub retries: u32,
    pub extra_args: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let retrieval = &config.retrieval;
        let backend = &config.backend;
        Self {
            server: config.server.clone(),
            retrieval: SanitizedRetrievalConfig {
                temp_root: retrieval.temp_root.clone(),
                credential_configured: retrieval.credential_path.is_some(),
                max_bytes: retrieval.max_bytes,
                per_attempt_timeout_secs: retrieval.per_attempt_timeout_secs,
                overall_timeout_secs: retrieval.overall_timeout_secs,
            },
            backend: SanitizedBackendConfig {
                ytdlp_path: backend.ytdlp_path.clone(),
                ffmpeg_configured: backend.ffmpeg_location.is_some(),
                socket_timeout_secs: backend.socket_timeout_secs,
                retries: backend.retries,
                extra_args: backend.extra_args.len(),
            },
            strategies: config.strategies.clone(),
            janitor: config.janitor.clone(),
        }
    }
}
