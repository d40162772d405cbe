//! Public entry point for retrieval.

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::chain::StrategyChain;
use super::error::RetrievalError;
use super::types::{Budget, InfoResult, RetrievalRequest, RetrievalResult, RetrievedMedia};
use crate::backend::MediaBackend;
use crate::config::{Config, ConfigError};
use crate::credentials::CredentialStore;
use crate::janitor::{ArtifactJanitor, JanitorError};
use crate::metrics::{ARTIFACT_BYTES, PROBES_TOTAL, RETRIEVALS_TOTAL, RETRIEVAL_DURATION};
use crate::platform::{self, Platform};
use crate::strategy::{StrategyCatalog, StrategySpec};

/// Detects the platform, runs the strategy chain, and owns cleanup.
///
/// Safe to share across tasks; independent retrievals run concurrently.
pub struct Orchestrator {
    chain: StrategyChain,
    janitor: Arc<ArtifactJanitor>,
    default_budget: Budget,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        catalog: StrategyCatalog,
        credentials: CredentialStore,
        janitor: ArtifactJanitor,
    ) -> Self {
        let janitor = Arc::new(janitor);
        let chain = StrategyChain::new(
            Arc::new(catalog),
            backend,
            Arc::new(credentials),
            Arc::clone(&janitor),
        );
        Self {
            chain,
            janitor,
            default_budget: Budget::default(),
        }
    }

    /// Build an orchestrator from loaded configuration.
    pub fn from_config(
        config: &Config,
        backend: Arc<dyn MediaBackend>,
    ) -> Result<Self, ConfigError> {
        let catalog = StrategyCatalog::new(&config.strategies)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        let orchestrator = Self::new(
            backend,
            catalog,
            CredentialStore::new(config.retrieval.credential_path.clone()),
            ArtifactJanitor::new(config.retrieval.temp_root.clone()),
        )
        .with_default_budget(config.retrieval.budget());
        Ok(orchestrator)
    }

    pub fn with_default_budget(mut self, budget: Budget) -> Self {
        self.default_budget = budget;
        self
    }

    /// Budget for requests that do not bring their own.
    pub fn default_budget(&self) -> Budget {
        self.default_budget
    }

    pub fn detect(&self, url: &str) -> Platform {
        platform::detect(url)
    }

    pub fn strategies_for(&self, platform: Platform) -> &[StrategySpec] {
        self.chain.strategies_for(platform)
    }

    pub fn backend(&self) -> &dyn MediaBackend {
        self.chain.backend()
    }

    pub fn janitor(&self) -> &ArtifactJanitor {
        &self.janitor
    }

    /// Retrieve media for `request`.
    pub async fn retrieve(
        &self,
        request: &RetrievalRequest,
    ) -> Result<RetrievalResult, RetrievalError> {
        self.retrieve_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Retrieve media, aborting early when `cancel` fires.
    ///
    /// On cancellation the in-flight backend call is dropped, the scope
    /// directory is removed, and [`RetrievalError::Cancelled`] is returned.
    pub async fn retrieve_with_cancel(
        &self,
        request: &RetrievalRequest,
        cancel: CancellationToken,
    ) -> Result<RetrievalResult, RetrievalError> {
        let started = Instant::now();
        let platform = platform::detect(request.url());
        info!(
            scope = request.scope_id(),
            %platform,
            "Retrieving {}",
            request.url()
        );

        let result = self.chain.run(request, platform, &cancel).await;

        let label = match &result {
            Ok(RetrievalResult::Success(media)) => {
                ARTIFACT_BYTES.observe(media.size_bytes as f64);
                info!(
                    scope = request.scope_id(),
                    "Retrieved {:?} via {} after {} attempt(s)",
                    media.artifact_path,
                    media.strategy_used,
                    media.attempts.len()
                );
                "success"
            }
            Ok(RetrievalResult::Failure(failure)) => {
                info!(
                    scope = request.scope_id(),
                    kind = %failure.kind,
                    "Retrieval failed after {} attempt(s)",
                    failure.attempts_tried()
                );
                failure.kind.as_str()
            }
            Err(RetrievalError::Cancelled) => "cancelled",
            Err(e) => {
                error!(scope = request.scope_id(), "Retrieval aborted: {}", e);
                "error"
            }
        };

        RETRIEVALS_TOTAL
            .with_label_values(&[platform.as_str(), label])
            .inc();
        RETRIEVAL_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    /// Look up metadata for `url` without downloading.
    pub async fn info(&self, url: &str) -> Result<InfoResult, RetrievalError> {
        self.info_with_cancel(url, CancellationToken::new()).await
    }

    /// Metadata lookup bounded by the default budget's timeouts.
    pub async fn info_with_cancel(
        &self,
        url: &str,
        cancel: CancellationToken,
    ) -> Result<InfoResult, RetrievalError> {
        if url.trim().is_empty() {
            return Err(RetrievalError::invalid_request("url must not be empty"));
        }
        let platform = platform::detect(url);
        debug!(%platform, "Probing {}", url);

        let result = self
            .chain
            .probe(url, platform, self.default_budget, &cancel)
            .await;

        let label = match &result {
            Ok(InfoResult::Found(_)) => "found",
            Ok(InfoResult::Failure(failure)) => failure.kind.as_str(),
            Err(RetrievalError::Cancelled) => "cancelled",
            Err(_) => "error",
        };
        PROBES_TOTAL
            .with_label_values(&[platform.as_str(), label])
            .inc();

        result
    }

    /// Give a handed-off artifact back for deletion.
    pub async fn release(&self, media: &RetrievedMedia) -> Result<(), JanitorError> {
        self.janitor.release_artifact(&media.scope_dir).await
    }
}
