//! Error types for the backend module.

use std::path::PathBuf;
use thiserror::Error;

use crate::classifier;
use crate::retrieval::FailureKind;

/// Errors reported by a media backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend executable not found.
    #[error("backend executable not found at path: {path}")]
    ExecutableNotFound { path: PathBuf },

    /// Backend ran and reported failure.
    #[error("backend failed (exit code {exit_code:?}): {message}")]
    Failed {
        message: String,
        exit_code: Option<i32>,
    },

    /// Backend exited cleanly but its output could not be understood.
    #[error("unexpected backend output: {message}")]
    InvalidOutput { message: String },

    /// I/O error while running the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Creates a failure from backend diagnostics.
    pub fn failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Failed {
            message: message.into(),
            exit_code,
        }
    }

    /// Classify this error into the retrieval taxonomy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Failed { message, .. } => classifier::classify(message),
            Self::ExecutableNotFound { .. } | Self::InvalidOutput { .. } | Self::Io(_) => {
                FailureKind::Backend
            }
        }
    }

    /// Short detail suitable for an attempt record.
    pub fn detail(&self) -> String {
        match self {
            Self::Failed { message, .. } => classifier::summarize(message),
            other => other.to_string(),
        }
    }
}
