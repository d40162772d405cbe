//! Media backend capability.
//!
//! The backend is the external tool that actually talks to the platform and
//! writes a media file. The orchestrator treats it as a black box behind the
//! [`MediaBackend`] trait: one invocation in, one artifact path or one error
//! out. `probe` is the metadata-only counterpart. [`YtDlpBackend`] drives the
//! `yt-dlp` executable; tests use `testing::MockBackend`.
//!
//! # Example
//!
//! ```ignore
//! use clipfetch_core::backend::{BackendConfig, MediaBackend, YtDlpBackend};
//!
//! let backend = YtDlpBackend::new(BackendConfig::default());
//! backend.validate().await?;
//! ```

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::BackendConfig;
pub use error::BackendError;
pub use traits::MediaBackend;
pub use types::{BackendInvocation, BackendOutput, MediaInfo, ProbeInvocation};
pub use ytdlp::YtDlpBackend;
