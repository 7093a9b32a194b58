//! # Metrics
//!
//! Prometheus metrics for reconciliation helpers.
//!
//! ## Metrics Exposed
//!
//! - `reconcile_resource_operations_total{operation,outcome}` - Synchronization calls by
//!   operation (`create_or_update`, `create_if_not_exists`, `delete`) and outcome
//!   (`created`, `updated`, `exists`, `deleted`, `absent`, `error`)
//! - `reconcile_results_total{outcome}` - Pass outcomes (`success`, `error`, `status_error`)
//! - `reconcile_status_write_failures_total` - Failed reconcile status writes
//! - `reconcile_requeue_delay_seconds` - Requeue delays handed back to the scheduler
//!
//! Values are recorded whether or not [`register_metrics`] has been called; only
//! registered metrics are exported.

use anyhow::Result;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RESOURCE_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reconcile_resource_operations_total",
            "Total number of resource synchronization operations",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create RESOURCE_OPERATIONS_TOTAL metric - this should never happen")
});

static RECONCILE_RESULTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reconcile_results_total",
            "Total number of reconciliation passes by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create RECONCILE_RESULTS_TOTAL metric - this should never happen")
});

static STATUS_WRITE_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "reconcile_status_write_failures_total",
        "Total number of failed reconcile status writes",
    )
    .expect("Failed to create STATUS_WRITE_FAILURES_TOTAL metric - this should never happen")
});

static REQUEUE_DELAY: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "reconcile_requeue_delay_seconds",
            "Requeue delay returned after a reconciliation pass in seconds",
        )
        .buckets(vec![
            0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 300.0, 900.0, 3600.0, 21600.0,
        ]),
    )
    .expect("Failed to create REQUEUE_DELAY metric - this should never happen")
});

/// Register all metrics with the crate registry
///
/// # Errors
///
/// Returns an error if a metric is already registered.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RESOURCE_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILE_RESULTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_WRITE_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUE_DELAY.clone()))?;

    Ok(())
}

/// Registered metrics in the Prometheus text exposition format
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn gather_metrics() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn record_resource_operation(operation: &str, outcome: &str) {
    RESOURCE_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

pub fn record_reconcile_result(outcome: &str) {
    RECONCILE_RESULTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_status_write_failures() {
    STATUS_WRITE_FAILURES_TOTAL.inc();
}

pub fn observe_requeue_delay(seconds: f64) {
    REQUEUE_DELAY.observe(seconds);
}
