//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Search fan-out (per-outcome durations, result counts)
//! - Enrichment and reconciliation failure counters
//! - Aggregation and download resolution outcomes
//! - Request coalescing

use once_cell::sync::Lazy;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts,
};

/// Guarded indexer search duration by outcome.
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "debridarr_search_duration_seconds",
            "Duration of guarded indexer searches",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["status"], // "success", "error", "timeout"
    )
    .unwrap()
});

/// Raw results merged per fan-out.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "debridarr_search_results",
            "Number of raw results merged per search fan-out",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
    )
    .unwrap()
});

/// Enrichment fetches dropped (failure or timeout).
pub static ENRICHMENT_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "debridarr_enrichment_failures_total",
        "Total enrichment fetches dropped",
    )
    .unwrap()
});

/// Cache reconciliations degraded to unannotated results.
pub static RECONCILE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "debridarr_reconcile_failures_total",
        "Total cache reconciliations skipped after provider errors",
    )
    .unwrap()
});

/// Callers that joined an in-flight execution instead of starting one.
pub static COALESCED_JOINS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "debridarr_coalesced_joins_total",
        "Total callers that awaited an in-flight execution",
    )
    .unwrap()
});

/// End-to-end aggregation duration by result.
pub static AGGREGATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "debridarr_aggregation_duration_seconds",
            "Duration of the aggregation pipeline",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"], // "success", "no_results", "error"
    )
    .unwrap()
});

/// Download resolutions by result.
pub static DOWNLOADS_RESOLVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "debridarr_downloads_resolved_total",
            "Total download resolutions",
        ),
        &["result"], // "success", "error"
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SEARCH_DURATION.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(ENRICHMENT_FAILURES.clone()),
        Box::new(RECONCILE_FAILURES.clone()),
        Box::new(COALESCED_JOINS.clone()),
        Box::new(AGGREGATION_DURATION.clone()),
        Box::new(DOWNLOADS_RESOLVED.clone()),
    ]
}
