//! Environment-level retrieval errors.
//!
//! Strategy failures are reported through [`super::RetrievalResult`]; these
//! errors cover conditions where no strategy could run at all.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The request was rejected before any work started.
    #[error("invalid retrieval request: {reason}")]
    InvalidRequest { reason: String },

    /// The per-request scope directory could not be created.
    #[error("failed to prepare scope directory {path}: {source}")]
    ScopeSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The caller cancelled the retrieval.
    #[error("retrieval cancelled")]
    Cancelled,
}

impl RetrievalError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn scope_setup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ScopeSetup {
            path: path.into(),
            source,
        }
    }
}
