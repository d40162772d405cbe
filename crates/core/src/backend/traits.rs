//! Trait definitions for the backend module.

use async_trait::async_trait;

use super::error::BackendError;
use super::types::{BackendInvocation, BackendOutput, MediaInfo, ProbeInvocation};

/// A tool that fetches a media file for a URL.
///
/// Implementations must be cancel-safe: dropping the `fetch` or `probe`
/// future must stop the underlying work.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Returns the name of this backend implementation.
    fn name(&self) -> &str;

    /// Runs one fetch into `invocation.output_dir`.
    async fn fetch(&self, invocation: &BackendInvocation) -> Result<BackendOutput, BackendError>;

    /// Looks up metadata without downloading.
    async fn probe(&self, invocation: &ProbeInvocation) -> Result<MediaInfo, BackendError>;

    /// Validates that the backend is installed and runnable.
    async fn validate(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
