//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Retrieval requests (outcome, latency, artifact size)
//! - Metadata lookups
//! - Individual strategy attempts
//! - Artifact cleanup

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Retrieval
// =============================================================================

/// Retrievals by platform and result ("success" or a failure kind).
pub static RETRIEVALS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipfetch_retrievals_total", "Total retrieval requests"),
        &["platform", "result"],
    )
    .unwrap()
});

/// End-to-end retrieval duration in seconds.
pub static RETRIEVAL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "clipfetch_retrieval_duration_seconds",
            "Duration of a full retrieval including fallbacks",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0]),
        &["result"],
    )
    .unwrap()
});

/// Size of delivered artifacts.
pub static ARTIFACT_BYTES: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("clipfetch_artifact_bytes", "Size of delivered artifacts")
            .buckets(prometheus::exponential_buckets(65_536.0, 4.0, 8).unwrap()),
    )
    .unwrap()
});

/// Metadata lookups by platform and result ("found" or a failure kind).
pub static PROBES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipfetch_probes_total", "Total metadata lookups"),
        &["platform", "result"],
    )
    .unwrap()
});

// =============================================================================
// Strategies
// =============================================================================

/// Strategy attempts by strategy name and outcome.
pub static ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipfetch_attempts_total", "Total strategy attempts"),
        &["strategy", "outcome"],
    )
    .unwrap()
});

pub static ATTEMPT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "clipfetch_attempt_duration_seconds",
            "Duration of a single strategy attempt",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0]),
        &["strategy"],
    )
    .unwrap()
});

// =============================================================================
// Cleanup
// =============================================================================

/// Filesystem entries removed by the janitor, by reason.
pub static JANITOR_REMOVALS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipfetch_janitor_removals_total", "Files and directories removed"),
        &["reason"], // "purge", "release", "sweep"
    )
    .unwrap()
});

/// All core metrics, for registration with a server registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RETRIEVALS_TOTAL.clone()),
        Box::new(RETRIEVAL_DURATION.clone()),
        Box::new(ARTIFACT_BYTES.clone()),
        Box::new(PROBES_TOTAL.clone()),
        Box::new(ATTEMPTS_TOTAL.clone()),
        Box::new(ATTEMPT_DURATION.clone()),
        Box::new(JANITOR_REMOVALS.clone()),
    ]
}
