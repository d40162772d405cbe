//! Temporary artifact ownership and cleanup.
//!
//! Every retrieval gets its own scope directory under the janitor root:
//! `<root>/<scope-id>/<request-uuid>/`. The janitor guarantees that on every
//! exit path only the successful artifact (if any) remains, and that it is
//! removed once the caller releases it.

mod artifact_janitor;
mod config;
mod error;
mod guard;

pub use artifact_janitor::{ArtifactJanitor, Scope, SweepReport};
pub use config::JanitorConfig;
pub use error::JanitorError;
pub use guard::ScopeGuard;
