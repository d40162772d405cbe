//! Retrieval strategies.
//!
//! A strategy is a static, tagged configuration describing how one backend
//! attempt presents itself: whether it uses the credential file, which client
//! fingerprint it imitates, and whether the backend should post-process the
//! result. All variants are executed by the single [`execute`] function;
//! [`probe`] runs the same variants for a metadata-only lookup.
//!
//! The order in which strategies are tried per platform comes from
//! [`StrategyOrderConfig`], not from code.

mod catalog;
mod config;
mod executor;
mod types;

pub use catalog::{builtin_strategies, StrategyCatalog, UnknownStrategy};
pub use config::StrategyOrderConfig;
pub use executor::{execute, probe, ProbeContext, ProbeOutcome, StrategyContext};
pub use types::{Attempt, AttemptOutcome, ClientProfile, StrategySpec};
