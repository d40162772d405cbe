//! Retrieval settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::types::Budget;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Root for per-request scope directories.
    #[serde(default = "default_temp_root")]
    pub temp_root: PathBuf,

    /// Netscape cookie file used by the credentialed strategy.
    #[serde(default = "default_credential_path")]
    pub credential_path: Option<PathBuf>,

    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    #[serde(default = "default_per_attempt_timeout")]
    pub per_attempt_timeout_secs: u64,

    #[serde(default = "default_overall_timeout")]
    pub overall_timeout_secs: u64,
}

fn default_temp_root() -> PathBuf {
    std::env::temp_dir().join("clipfetch")
}

fn default_credential_path() -> Option<PathBuf> {
    Some(PathBuf::from("cookies.txt"))
}

fn default_max_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_per_attempt_timeout() -> u64 {
    15
}

fn default_overall_timeout() -> u64 {
    60
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            temp_root: default_temp_root(),
            credential_path: default_credential_path(),
            max_bytes: default_max_bytes(),
            per_attempt_timeout_secs: default_per_attempt_timeout(),
            overall_timeout_secs: default_overall_timeout(),
        }
    }
}

impl RetrievalConfig {
    /// Default budget for requests that do not override it.
    pub fn budget(&self) -> Budget {
        Budget {
            max_bytes: self.max_bytes,
            per_attempt_timeout: Duration::from_secs(self.per_attempt_timeout_secs),
            overall_timeout: Duration::from_secs(self.overall_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget() {
        let config = RetrievalConfig::default();
        assert_eq!(config.budget(), Budget::default());
        assert_eq!(config.credential_path, Some(PathBuf::from("cookies.txt")));
    }

    #[test]
    fn test_deserialize_overrides() {
        let toml = r#"
temp_root = "/var/tmp/clips"
max_bytes = 1024
per_attempt_timeout_secs = 5
"#;
        let config: RetrievalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.temp_root, PathBuf::from("/var/tmp/clips"));
        let budget = config.budget();
        assert_eq!(budget.max_bytes, 1024);
        assert_eq!(budget.per_attempt_timeout, Duration::from_secs(5));
        assert_eq!(budget.overall_timeout, Duration::from_secs(60));
    }
}
