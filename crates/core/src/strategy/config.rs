//! Per-platform strategy order.

use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Ordered strategy names per platform, most preferred first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyOrderConfig {
    #[serde(default = "default_youtube")]
    pub youtube: Vec<String>,

    #[serde(default = "default_short_form")]
    pub instagram: Vec<String>,

    #[serde(default = "default_short_form")]
    pub tiktok: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_youtube() -> Vec<String> {
    names(&["cookies", "android", "ios", "web", "minimal"])
}

// The mobile client profiles only change behaviour on YouTube.
fn default_short_form() -> Vec<String> {
    names(&["cookies", "web", "minimal"])
}

impl Default for StrategyOrderConfig {
    fn default() -> Self {
        Self {
            youtube: default_youtube(),
            instagram: default_short_form(),
            tiktok: default_short_form(),
        }
    }
}

impl StrategyOrderConfig {
    /// Names configured for `platform`; empty for unsupported URLs.
    pub fn order_for(&self, platform: Platform) -> &[String] {
        match platform {
            Platform::YouTube => &self.youtube,
            Platform::Instagram => &self.instagram,
            Platform::TikTok => &self.tiktok,
            Platform::Unsupported => &[],
        }
    }

    pub fn with_order(mut self, platform: Platform, order: &[&str]) -> Self {
        let order = names(order);
        match platform {
            Platform::YouTube => self.youtube = order,
            Platform::Instagram => self.instagram = order,
            Platform::TikTok => self.tiktok = order,
            Platform::Unsupported => {}
        }
        self
    }
}
