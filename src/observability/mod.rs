//! # Observability
//!
//! - `logging`: tracing subscriber setup
//! - `metrics`: Prometheus metrics for synchronization and requeue decisions

pub mod logging;
pub mod metrics;

use crate::config::ReconcilerConfig;
use anyhow::{Context, Result};

pub use logging::init_tracing;
pub use metrics::{gather_metrics, register_metrics};

/// Install the tracing subscriber and, when enabled, register metrics
///
/// # Errors
///
/// Returns an error if a subscriber is already installed or metrics are already
/// registered.
pub fn init(config: &ReconcilerConfig) -> Result<()> {
    init_tracing(config)?;
    if config.enable_metrics {
        register_metrics().context("Failed to register metrics")?;
    }
    Ok(())
}
