//! Executes a single strategy against the backend.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant as StdInstant;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{Attempt, AttemptOutcome, StrategySpec};
use crate::backend::{BackendInvocation, MediaBackend, MediaInfo, ProbeInvocation};
use crate::credentials::CredentialStore;
use crate::platform::Platform;
use crate::retrieval::{FailureKind, RetrievalError, RetrievalRequest};

/// Everything an attempt borrows from the surrounding retrieval.
pub struct StrategyContext<'a> {
    pub request: &'a RetrievalRequest,
    pub platform: Platform,
    pub scope_dir: &'a Path,
    pub backend: &'a dyn MediaBackend,
    pub credentials: &'a CredentialStore,
    /// Hard stop for this attempt.
    pub deadline: Instant,
    pub cancel: &'a CancellationToken,
}

/// Run one strategy and record what happened.
///
/// Failures are returned as data inside the [`Attempt`]. The only error is
/// [`RetrievalError::Cancelled`], raised when the caller's token fires while
/// the backend is running. The backend future is dropped in that case, which
/// stops it. Partial files may remain in the scope directory.
pub async fn execute(
    ctx: &StrategyContext<'_>,
    spec: &StrategySpec,
) -> Result<Attempt, RetrievalError> {
    let started_at = Utc::now();
    let clock = StdInstant::now();

    let credential_path = match credential_for(ctx.credentials, spec).await {
        Ok(path) => path,
        Err(detail) => {
            return Ok(Attempt::failure(
                &spec.name,
                FailureKind::MissingCredential,
                detail,
                clock.elapsed(),
                started_at,
            ));
        }
    };

    let invocation = BackendInvocation {
        url: ctx.request.url().to_string(),
        platform: ctx.platform,
        profile: spec.client_profile,
        credential_path,
        output_dir: ctx.scope_dir.to_path_buf(),
        post_process: spec.uses_post_processing,
        max_bytes: ctx.request.max_bytes(),
    };

    let result = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return Err(RetrievalError::Cancelled),
        r = tokio::time::timeout_at(ctx.deadline, ctx.backend.fetch(&invocation)) => r,
    };

    let failure = |kind: FailureKind, detail: String| -> Result<Attempt, RetrievalError> {
        Ok(Attempt::failure(
            &spec.name,
            kind,
            detail,
            clock.elapsed(),
            started_at,
        ))
    };

    let output = match result {
        Err(_) => {
            return failure(
                FailureKind::Timeout,
                format!(
                    "attempt cancelled at deadline after {} ms",
                    clock.elapsed().as_millis()
                ),
            );
        }
        Ok(Err(e)) => {
            warn!(
                "Strategy {} failed via {}: {}",
                spec.name,
                ctx.backend.name(),
                e
            );
            return failure(e.failure_kind(), e.detail());
        }
        Ok(Ok(output)) => output,
    };

    let Some(artifact_path) = output.artifact else {
        return failure(
            FailureKind::Backend,
            "backend reported success but produced no file".to_string(),
        );
    };

    if let Err(detail) = ensure_within(&artifact_path, ctx.scope_dir).await {
        warn!("Strategy {} rejected artifact: {}", spec.name, detail);
        return failure(FailureKind::Backend, detail);
    }

    let size_bytes = match tokio::fs::metadata(&artifact_path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => meta.len(),
        Ok(_) => {
            return failure(
                FailureKind::Backend,
                format!("artifact {} is empty", artifact_path.display()),
            );
        }
        Err(e) => {
            return failure(
                FailureKind::Backend,
                format!("artifact {} is unreadable: {}", artifact_path.display(), e),
            );
        }
    };

    Ok(Attempt {
        strategy: spec.name.clone(),
        outcome: AttemptOutcome::Success {
            artifact_path,
            size_bytes,
            title: output.title,
        },
        duration: clock.elapsed(),
        started_at,
    })
}

/// Metadata on success, the failed attempt otherwise.
pub type ProbeOutcome = Result<MediaInfo, Attempt>;

/// Borrowed inputs for one metadata probe.
pub struct ProbeContext<'a> {
    pub url: &'a str,
    pub platform: Platform,
    pub backend: &'a dyn MediaBackend,
    pub credentials: &'a CredentialStore,
    pub deadline: Instant,
    pub cancel: &'a CancellationToken,
}

/// Look up metadata with one strategy.
///
/// Returns the metadata, or the failed [`Attempt`]. Cancellation behaves as
/// in [`execute`].
pub async fn probe(
    ctx: &ProbeContext<'_>,
    spec: &StrategySpec,
) -> Result<ProbeOutcome, RetrievalError> {
    let started_at = Utc::now();
    let clock = StdInstant::now();
    let failure = |kind: FailureKind, detail: String| -> Result<ProbeOutcome, RetrievalError> {
        Ok(Err(Attempt::failure(
            &spec.name,
            kind,
            detail,
            clock.elapsed(),
            started_at,
        )))
    };

    let credential_path = match credential_for(ctx.credentials, spec).await {
        Ok(path) => path,
        Err(detail) => return failure(FailureKind::MissingCredential, detail),
    };

    let invocation = ProbeInvocation {
        url: ctx.url.to_string(),
        platform: ctx.platform,
        profile: spec.client_profile,
        credential_path,
    };

    let result = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return Err(RetrievalError::Cancelled),
        r = tokio::time::timeout_at(ctx.deadline, ctx.backend.probe(&invocation)) => r,
    };

    match result {
        Err(_) => failure(
            FailureKind::Timeout,
            format!(
                "probe cancelled at deadline after {} ms",
                clock.elapsed().as_millis()
            ),
        ),
        Ok(Err(e)) => {
            debug!("Probe with {} failed: {}", spec.name, e);
            failure(e.failure_kind(), e.detail())
        }
        Ok(Ok(info)) => Ok(Ok(info)),
    }
}

/// Credential file for `spec`, or the reason it is unavailable.
async fn credential_for(
    credentials: &CredentialStore,
    spec: &StrategySpec,
) -> Result<Option<PathBuf>, String> {
    if !spec.requires_credential_file {
        return Ok(None);
    }
    match credentials.resolve().await {
        Ok(path) => Ok(Some(path)),
        Err(e) => {
            debug!("Strategy {} skipped: {}", spec.name, e);
            Err(e.to_string())
        }
    }
}

/// Reject artifacts that resolve outside the scope directory.
async fn ensure_within(artifact: &Path, scope_dir: &Path) -> Result<(), String> {
    let resolved = tokio::fs::canonicalize(artifact)
        .await
        .map_err(|e| format!("artifact {} is unreadable: {}", artifact.display(), e))?;
    let scope = tokio::fs::canonicalize(scope_dir)
        .await
        .map_err(|e| format!("scope {} is unreadable: {}", scope_dir.display(), e))?;
    if resolved.starts_with(&scope) && resolved != scope {
        Ok(())
    } else {
        Err(format!(
            "artifact {} is outside the scope directory",
            artifact.display()
        ))
    }
}
