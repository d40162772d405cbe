//! URL pattern matching.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

use super::types::Platform;

/// Pattern groups per platform, checked in order. The first match wins.
static PATTERNS: Lazy<Vec<(Platform, Regex)>> = Lazy::new(|| {
    let groups: &[(Platform, &str)] = &[
        (
            Platform::YouTube,
            r"^(?:https?://)?(?:www\.|m\.|music\.)?youtube\.com/(?:watch\?(?:.*&)?v=[\w-]+|shorts/[\w-]+|embed/[\w-]+|live/[\w-]+|v/[\w-]+)",
        ),
        (Platform::YouTube, r"^(?:https?://)?youtu\.be/[\w-]+"),
        (
            Platform::Instagram,
            r"^(?:https?://)?(?:www\.)?instagram\.com/(?:[\w.]+/)?(?:p|reel|reels|tv)/[\w-]+",
        ),
        (Platform::Instagram, r"^(?:https?://)?(?:www\.)?instagr\.am/(?:p|reel|tv)/[\w-]+"),
        (
            Platform::TikTok,
            r"^(?:https?://)?(?:www\.|m\.)?tiktok\.com/(?:@[\w.-]+/video/\d+|t/[\w-]+|v/\d+)",
        ),
        (Platform::TikTok, r"^(?:https?://)?(?:vm|vt)\.tiktok\.com/[\w-]+"),
    ];

    groups
        .iter()
        .map(|(platform, pattern)| {
            let re = Regex::new(pattern).expect("platform pattern must compile");
            (*platform, re)
        })
        .collect()
});

/// Loose URL matcher for free text.
static URL_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s<>]+").expect("url pattern must compile"));

/// Classify a URL into a platform.
///
/// Matching is case-insensitive on the host and ignores surrounding
/// whitespace. Anything that does not match a known domain and path shape,
/// including malformed input, is [`Platform::Unsupported`].
pub fn detect(url: &str) -> Platform {
    let candidate = url.trim();
    if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
        return Platform::Unsupported;
    }

    let normalized = lowercase_host(candidate);
    PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(&normalized))
        .map(|(platform, _)| *platform)
        .unwrap_or(Platform::Unsupported)
}

/// A URL found in free text together with its platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedUrl {
    pub url: String,
    pub platform: Platform,
}

/// Return the first URL in `text` that belongs to a supported platform.
pub fn find_supported_url(text: &str) -> Option<DetectedUrl> {
    URL_IN_TEXT
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']', '"', '\'']))
        .find_map(|url| {
            let platform = detect(url);
            platform.is_supported().then(|| DetectedUrl {
                url: url.to_string(),
                platform,
            })
        })
}

/// Lowercase scheme and host, keep the path as written (video ids are case sensitive).
fn lowercase_host(url: &str) -> String {
    let (scheme, rest) = match url.find("://") {
        Some(idx) => (&url[..idx + 3], &url[idx + 3..]),
        None => ("", url),
    };
    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (host, path) = rest.split_at(host_end);
    format!(
        "{}{}{}",
        scheme.to_ascii_lowercase(),
        host.to_ascii_lowercase(),
        path
    )
}
