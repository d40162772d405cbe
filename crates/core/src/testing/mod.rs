//! Testing utilities and mock implementations.
//!
//! [`MockBackend`] stands in for the real media tool so the whole retrieval
//! path can be exercised without network access or external binaries.
//!
//! # Example
//!
//! ```rust,ignore
//! use clipfetch_core::testing::{fixtures, MockBackend, MockBehavior};
//!
//! let backend = MockBackend::new();
//! backend.set_behavior(ClientProfile::GeneralWeb, MockBehavior::succeed(2048)).await;
//!
//! let request = fixtures::request(fixtures::YOUTUBE_URL, "chat-1");
//! ```

mod mock_backend;

pub use mock_backend::{MockBackend, MockBehavior};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::retrieval::{Budget, RetrievalRequest};

    pub const YOUTUBE_URL: &str = "https://www.youtube.com/shorts/dQw4w9WgXcQ";
    pub const INSTAGRAM_URL: &str = "https://www.instagram.com/reel/C1a2B3c4D5e/";
    pub const TIKTOK_URL: &str = "https://www.tiktok.com/@someone/video/7301234567890123456";
    pub const UNSUPPORTED_URL: &str = "https://vimeo.com/123456";

    /// A minimal valid Netscape cookie file.
    pub const COOKIE_FILE: &str = "# Netscape HTTP Cookie File\n\
        .youtube.com\tTRUE\t/\tTRUE\t1999999999\tPREF\tf6=40000000\n";

    /// Write a valid cookie file into `dir` and return its path.
    pub fn write_cookie_file(dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join("cookies.txt");
        std::fs::write(&path, COOKIE_FILE)?;
        Ok(path)
    }

    /// Budget small enough for tests to hit every limit quickly.
    pub fn test_budget() -> Budget {
        Budget::default()
            .with_max_bytes(1024 * 1024)
            .with_per_attempt_timeout(std::time::Duration::from_secs(5))
            .with_overall_timeout(std::time::Duration::from_secs(20))
    }

    /// Build a request with [`test_budget`].
    ///
    /// Panics on invalid input; test-only.
    pub fn request(url: &str, scope_id: &str) -> RetrievalRequest {
        RetrievalRequest::new(url, scope_id, test_budget()).expect("valid test request")
    }
}
