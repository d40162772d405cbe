//! Platform detection for incoming media URLs.
//!
//! A URL is classified once per request into one of the supported video
//! platforms, or [`Platform::Unsupported`]. Detection is pure and total: it
//! never performs I/O and never fails.

mod detector;
mod types;

pub use detector::{detect, find_supported_url, DetectedUrl};
pub use types::Platform;
