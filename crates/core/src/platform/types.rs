use serde::{Deserialize, Serialize};
use std::fmt;

/// Video platform a URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "youtube")]
    YouTube,
    #[serde(rename = "instagram")]
    Instagram,
    #[serde(rename = "tiktok")]
    TikTok,
    #[serde(rename = "unsupported")]
    Unsupported,
}

impl Platform {
    /// All platforms that have retrieval strategies.
    pub const SUPPORTED: [Platform; 3] = [Platform::YouTube, Platform::Instagram, Platform::TikTok];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Platform::Unsupported)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
