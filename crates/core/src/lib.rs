pub mod backend;
pub mod classifier;
pub mod config;
pub mod credentials;
pub mod janitor;
pub mod metrics;
pub mod platform;
pub mod retrieval;
pub mod strategy;
pub mod testing;

pub use backend::{BackendConfig, BackendError, MediaBackend, MediaInfo, YtDlpBackend};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use credentials::{CredentialError, CredentialStore};
pub use janitor::{ArtifactJanitor, JanitorConfig, JanitorError, SweepReport};
pub use platform::{detect, find_supported_url, DetectedUrl, Platform};
pub use retrieval::{
    Budget, FailureKind, Guidance, InfoResult, MediaReport, Orchestrator, RetrievalError,
    RetrievalFailure, RetrievalRequest, RetrievalResult, RetrievedMedia,
};
pub use strategy::{Attempt, AttemptOutcome, ClientProfile, StrategyCatalog, StrategySpec};
