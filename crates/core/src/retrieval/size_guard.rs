//! Post-download size enforcement.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::types::FailureKind;

#[derive(Debug, Error)]
pub enum SizeViolation {
    /// Artifact exceeds the budget. The file has already been deleted.
    #[error("artifact is {size_bytes} bytes, limit is {max_bytes} bytes")]
    TooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("cannot stat artifact {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SizeViolation {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            SizeViolation::TooLarge { .. } => FailureKind::TooLarge,
            SizeViolation::Unreadable { .. } => FailureKind::Backend,
        }
    }
}

/// Check `artifact_path` against `max_bytes`, returning its size.
///
/// An artifact of exactly `max_bytes` passes. On violation the artifact is
/// deleted before returning.
pub async fn check(artifact_path: &Path, max_bytes: u64) -> Result<u64, SizeViolation> {
    let size_bytes = tokio::fs::metadata(artifact_path)
        .await
        .map_err(|e| SizeViolation::Unreadable {
            path: artifact_path.to_path_buf(),
            source: e,
        })?
        .len();

    if size_bytes <= max_bytes {
        return Ok(size_bytes);
    }

    info!(
        "Artifact {:?} is {} bytes, over the {} byte limit; deleting",
        artifact_path, size_bytes, max_bytes
    );
    if let Err(e) = tokio::fs::remove_file(artifact_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to delete oversized artifact {:?}: {}", artifact_path, e);
        }
    }

    Err(SizeViolation::TooLarge {
        size_bytes,
        max_bytes,
    })
}
