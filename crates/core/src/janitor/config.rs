//! Configuration for the periodic stale-artifact sweep.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// Run the sweep at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Files older than this are removed by the sweep.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_max_age() -> u64 {
    24 * 3600
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sweep_interval_secs: default_sweep_interval(),
            max_age_secs: default_max_age(),
        }
    }
}

impl JanitorConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}
