//! Ordered strategy execution for one request.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::RetrievalError;
use super::size_guard;
use super::types::{
    Budget, FailureKind, InfoResult, MediaReport, RetrievalFailure, RetrievalRequest,
    RetrievalResult, RetrievedMedia,
};
use crate::backend::MediaBackend;
use crate::credentials::CredentialStore;
use crate::janitor::{ArtifactJanitor, JanitorError, Scope, ScopeGuard};
use crate::metrics::{ATTEMPTS_TOTAL, ATTEMPT_DURATION};
use crate::platform::Platform;
use crate::strategy::{
    self, Attempt, AttemptOutcome, ProbeContext, StrategyCatalog, StrategyContext, StrategySpec,
};

/// Title used when the backend does not report one.
const DEFAULT_TITLE: &str = "video";

/// Runs the configured strategies for a platform, strictly in order, until
/// one succeeds or the budget is spent.
pub struct StrategyChain {
    catalog: Arc<StrategyCatalog>,
    backend: Arc<dyn MediaBackend>,
    credentials: Arc<CredentialStore>,
    janitor: Arc<ArtifactJanitor>,
}

impl StrategyChain {
    pub fn new(
        catalog: Arc<StrategyCatalog>,
        backend: Arc<dyn MediaBackend>,
        credentials: Arc<CredentialStore>,
        janitor: Arc<ArtifactJanitor>,
    ) -> Self {
        Self {
            catalog,
            backend,
            credentials,
            janitor,
        }
    }

    pub fn strategies_for(&self, platform: Platform) -> &[StrategySpec] {
        self.catalog.for_platform(platform)
    }

    pub fn backend(&self) -> &dyn MediaBackend {
        self.backend.as_ref()
    }

    /// Run the chain.
    ///
    /// - No strategies for the platform: `UnsupportedPlatform`, zero attempts,
    ///   and no scope directory is created.
    /// - Each attempt gets `min(now + per_attempt_timeout, overall deadline)`.
    ///   Once the overall deadline passes no further strategy starts.
    /// - Partial files are purged after every failed attempt.
    /// - A success is size-checked; an oversized artifact is deleted and ends
    ///   the chain with `TooLarge`.
    /// - The aggregate failure kind is the kind of the last attempt.
    pub async fn run(
        &self,
        request: &RetrievalRequest,
        platform: Platform,
        cancel: &CancellationToken,
    ) -> Result<RetrievalResult, RetrievalError> {
        let specs = self.catalog.for_platform(platform);
        if specs.is_empty() {
            debug!("No strategies for {} ({})", request.url(), platform);
            return Ok(RetrievalResult::Failure(RetrievalFailure {
                kind: FailureKind::UnsupportedPlatform,
                platform,
                attempts: Vec::new(),
            }));
        }

        let scope = self
            .janitor
            .scope_dir(request.scope_id())
            .await
            .map_err(|e| match e {
                JanitorError::CreateDir { path, source } => {
                    RetrievalError::scope_setup(path, source)
                }
                other => RetrievalError::scope_setup(
                    self.janitor.scope_parent(request.scope_id()),
                    std::io::Error::other(other),
                ),
            })?;
        let mut guard = ScopeGuard::new(&scope);

        let budget = *request.budget();
        let overall_deadline = Instant::now() + budget.overall_timeout;
        let mut attempts: Vec<Attempt> = Vec::with_capacity(specs.len());

        for spec in specs {
            if cancel.is_cancelled() {
                self.release(&scope, &mut guard).await;
                return Err(RetrievalError::Cancelled);
            }

            let now = Instant::now();
            if now >= overall_deadline {
                info!(
                    "Overall deadline reached for scope {}, not starting strategy {}",
                    scope.id(),
                    spec.name
                );
                break;
            }
            let deadline = (now + budget.per_attempt_timeout).min(overall_deadline);

            let ctx = StrategyContext {
                request,
                platform,
                scope_dir: scope.dir(),
                backend: self.backend.as_ref(),
                credentials: self.credentials.as_ref(),
                deadline,
                cancel,
            };

            debug!("Trying strategy {} for {}", spec.name, request.url());
            let attempt = match strategy::execute(&ctx, spec).await {
                Ok(attempt) => attempt,
                Err(e) => {
                    self.release(&scope, &mut guard).await;
                    return Err(e);
                }
            };
            let attempt = Self::enforce_size(attempt, budget.max_bytes).await;
            record_attempt(&attempt);

            if let Some((artifact_path, size_bytes, title)) = success_parts(&attempt) {
                if let Err(e) = self.janitor.purge(&scope, Some(&artifact_path)).await {
                    warn!("Failed to purge leftovers in {:?}: {}", scope.dir(), e);
                }
                guard.disarm();

                info!(
                    "Strategy {} retrieved {} bytes for scope {}",
                    attempt.strategy,
                    size_bytes,
                    scope.id()
                );
                let strategy_used = attempt.strategy.clone();
                attempts.push(attempt);

                return Ok(RetrievalResult::Success(RetrievedMedia {
                    artifact_path,
                    size_bytes,
                    strategy_used,
                    title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                    platform,
                    scope_dir: scope.dir().to_path_buf(),
                    attempts,
                }));
            }

            let kind = attempt.failure_kind().unwrap_or(FailureKind::Backend);
            info!(
                "Strategy {} failed for scope {}: {}",
                attempt.strategy,
                scope.id(),
                kind
            );
            attempts.push(attempt);

            if let Err(e) = self.janitor.purge(&scope, None).await {
                warn!("Failed to purge partial files in {:?}: {}", scope.dir(), e);
            }

            if !kind.allows_fallback() {
                debug!("{} is terminal, not trying further strategies", kind);
                break;
            }
        }

        self.release(&scope, &mut guard).await;

        let kind = attempts
            .last()
            .and_then(Attempt::failure_kind)
            .unwrap_or(FailureKind::Timeout);
        Ok(RetrievalResult::Failure(RetrievalFailure {
            kind,
            platform,
            attempts,
        }))
    }

    /// Look up metadata, trying strategies in the same order as [`run`].
    ///
    /// Nothing is written to disk. Only the budget's timeouts apply.
    ///
    /// [`run`]: StrategyChain::run
    pub async fn probe(
        &self,
        url: &str,
        platform: Platform,
        budget: Budget,
        cancel: &CancellationToken,
    ) -> Result<InfoResult, RetrievalError> {
        let specs = self.catalog.for_platform(platform);
        let overall_deadline = Instant::now() + budget.overall_timeout;
        let mut attempts: Vec<Attempt> = Vec::new();

        for spec in specs {
            if cancel.is_cancelled() {
                return Err(RetrievalError::Cancelled);
            }
            let now = Instant::now();
            if now >= overall_deadline {
                break;
            }

            let ctx = ProbeContext {
                url,
                platform,
                backend: self.backend.as_ref(),
                credentials: self.credentials.as_ref(),
                deadline: (now + budget.per_attempt_timeout).min(overall_deadline),
                cancel,
            };
            match strategy::probe(&ctx, spec).await? {
                Ok(info) => {
                    debug!("Strategy {} described {}", spec.name, url);
                    return Ok(InfoResult::Found(MediaReport {
                        info,
                        strategy_used: spec.name.clone(),
                        platform,
                        attempts,
                    }));
                }
                Err(attempt) => {
                    let kind = attempt.failure_kind().unwrap_or(FailureKind::Backend);
                    attempts.push(attempt);
                    if !kind.allows_fallback() {
                        break;
                    }
                }
            }
        }

        let kind = if specs.is_empty() {
            FailureKind::UnsupportedPlatform
        } else {
            attempts
                .last()
                .and_then(Attempt::failure_kind)
                .unwrap_or(FailureKind::Timeout)
        };
        Ok(InfoResult::Failure(RetrievalFailure {
            kind,
            platform,
            attempts,
        }))
    }

    /// Convert an oversized success into a `TooLarge` failure.
    async fn enforce_size(mut attempt: Attempt, max_bytes: u64) -> Attempt {
        let verdict = match &attempt.outcome {
            AttemptOutcome::Success { artifact_path, .. } => {
                Some(size_guard::check(artifact_path, max_bytes).await)
            }
            AttemptOutcome::Failure { .. } => None,
        };

        match verdict {
            Some(Ok(actual)) => {
                if let AttemptOutcome::Success { size_bytes, .. } = &mut attempt.outcome {
                    *size_bytes = actual;
                }
            }
            Some(Err(violation)) => {
                attempt.outcome = AttemptOutcome::Failure {
                    kind: violation.failure_kind(),
                    detail: violation.to_string(),
                };
            }
            None => {}
        }
        attempt
    }

    async fn release(&self, scope: &Scope, guard: &mut ScopeGuard) {
        match self.janitor.release_scope(scope).await {
            Ok(()) => guard.disarm(),
            // Leave the guard armed so drop retries synchronously.
            Err(e) => warn!("Failed to release scope {:?}: {}", scope.dir(), e),
        }
    }
}

fn success_parts(attempt: &Attempt) -> Option<(PathBuf, u64, Option<String>)> {
    match &attempt.outcome {
        AttemptOutcome::Success {
            artifact_path,
            size_bytes,
            title,
        } => Some((artifact_path.clone(), *size_bytes, title.clone())),
        AttemptOutcome::Failure { .. } => None,
    }
}

fn record_attempt(attempt: &Attempt) {
    ATTEMPTS_TOTAL
        .with_label_values(&[attempt.strategy.as_str(), attempt.outcome_label()])
        .inc();
    ATTEMPT_DURATION
        .with_label_values(&[attempt.strategy.as_str()])
        .observe(attempt.duration.as_secs_f64());
}
