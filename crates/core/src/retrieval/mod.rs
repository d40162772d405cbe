//! Media retrieval orchestration.
//!
//! [`Orchestrator::retrieve`] is the single entry point: it classifies the URL,
//! runs the [`StrategyChain`] for that platform within the request's
//! [`Budget`], enforces the size limit, and guarantees that only the
//! successful artifact survives.
//!
//! # Example
//!
//! ```ignore
//! use clipfetch_core::{Budget, Orchestrator, RetrievalRequest, RetrievalResult};
//!
//! let request = RetrievalRequest::new(url, chat_id.to_string(), Budget::default())?;
//! match orchestrator.retrieve(&request).await? {
//!     RetrievalResult::Success(media) => {
//!         send_file(&media.artifact_path).await;
//!         orchestrator.release(&media).await?;
//!     }
//!     RetrievalResult::Failure(failure) => reply(failure.kind.guidance()).await,
//! }
//! ```

mod chain;
mod config;
mod error;
mod orchestrator;
pub mod size_guard;
mod types;

pub use chain::StrategyChain;
pub use config::RetrievalConfig;
pub use error::RetrievalError;
pub use orchestrator::Orchestrator;
pub use size_guard::SizeViolation;
pub use types::{
    Budget, FailureKind, Guidance, InfoResult, MediaReport, RetrievalFailure, RetrievalRequest,
    RetrievalResult, RetrievedMedia,
};
