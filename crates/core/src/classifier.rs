//! Maps raw backend diagnostics onto [`FailureKind`].
//!
//! The backend reports failures as free text on stderr. Classification is a
//! lowercase substring match against known signals, checked from the most to
//! the least specific. Unknown output is [`FailureKind::Backend`].

use crate::retrieval::FailureKind;

/// Longest detail kept from backend output.
const MAX_DETAIL_LEN: usize = 500;

const TOO_LARGE: &[&str] = &[
    "max-filesize",
    "larger than max",
    "file is larger than",
    "exceeds the maximum",
];

const AUTH_REQUIRED: &[&str] = &[
    "sign in to confirm",
    "not a bot",
    "cookies are no longer valid",
    "use --cookies",
    "--cookies-from-browser",
    "please sign in",
    "login required",
    "log in to",
    "private video",
    "this video is private",
    "age-restricted",
    "confirm your age",
    "members-only",
    "http error 401",
    "http error 403",
    "403: forbidden",
];

const TIMEOUT: &[&str] = &["timed out", "timeout", "time-out"];

const UNSUPPORTED: &[&str] = &["unsupported url", "no suitable extractor"];

/// Classify raw backend output. Never fails.
pub fn classify(raw: &str) -> FailureKind {
    let text = raw.to_lowercase();
    let has = |patterns: &[&str]| patterns.iter().any(|p| text.contains(p));

    if has(TOO_LARGE) {
        FailureKind::TooLarge
    } else if is_missing_credential(&text) {
        FailureKind::MissingCredential
    } else if has(AUTH_REQUIRED) {
        FailureKind::AuthRequired
    } else if has(TIMEOUT) {
        FailureKind::Timeout
    } else if has(UNSUPPORTED) {
        FailureKind::UnsupportedPlatform
    } else {
        FailureKind::Backend
    }
}

fn is_missing_credential(text: &str) -> bool {
    text.contains("cookie")
        && ["no such file", "not found", "does not exist", "could not open"]
            .iter()
            .any(|p| text.contains(p))
}

/// Reduce backend output to a short detail string.
///
/// Prefers the last `ERROR:` line, falls back to the last non-empty line, and
/// caps the length.
pub fn summarize(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let picked = lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .copied()
        .unwrap_or("backend produced no output");

    if picked.len() <= MAX_DETAIL_LEN {
        return picked.to_string();
    }
    let mut end = MAX_DETAIL_LEN;
    while !picked.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &picked[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_detection_is_auth() {
        let raw = "ERROR: [youtube] dQw4w9WgXcQ: Sign in to confirm you're not a bot. \
                   Use --cookies-from-browser or --cookies for the authentication.";
        assert_eq!(classify(raw), FailureKind::AuthRequired);
    }

    #[test]
    fn test_forbidden_is_auth() {
        assert_eq!(
            classify("ERROR: unable to download video data: HTTP Error 403: Forbidden"),
            FailureKind::AuthRequired
        );
    }

    #[test]
    fn test_missing_cookie_file() {
        assert_eq!(
            classify("FileNotFoundError: cookies.txt: No such file or directory"),
            FailureKind::MissingCredential
        );
    }

    #[test]
    fn test_timeouts() {
        assert_eq!(
            classify("ERROR: Read timed out. (read timeout=10)"),
            FailureKind::Timeout
        );
    }

    #[test]
    fn test_too_large() {
        assert_eq!(
            classify("[download] File is larger than max-filesize (52428800 bytes > 1000 bytes). Aborting."),
            FailureKind::TooLarge
        );
    }

    #[test]
    fn test_unsupported_url() {
        assert_eq!(
            classify("ERROR: Unsupported URL: https://example.com"),
            FailureKind::UnsupportedPlatform
        );
    }

    #[test]
    fn test_unknown_is_backend() {
        assert_eq!(classify("ERROR: something odd happened"), FailureKind::Backend);
        assert_eq!(classify(""), FailureKind::Backend);
        assert_eq!(
            classify("ERROR: HTTP Error 429: Too Many Requests"),
            FailureKind::Backend
        );
    }

    #[test]
    fn test_summarize_prefers_error_line() {
        let raw = "[youtube] Extracting URL\nERROR: first\nWARNING: noise\nERROR: second\n";
        assert_eq!(summarize(raw), "ERROR: second");
        assert_eq!(summarize("only line\n\n"), "only line");
        assert_eq!(summarize(""), "backend produced no output");
    }

    #[test]
    fn test_summarize_caps_length() {
        let raw = "x".repeat(MAX_DETAIL_LEN * 2);
        let detail = summarize(&raw);
        assert_eq!(detail.len(), MAX_DETAIL_LEN + 3);
        assert!(detail.ends_with("..."));
    }
}
