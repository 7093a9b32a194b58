//! # Logging
//!
//! Installs the global tracing subscriber. `RUST_LOG`, when set, takes precedence over
//! the configured level.

use crate::config::ReconcilerConfig;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
#[must_use]
pub fn default_filter(config: &ReconcilerConfig) -> EnvFilter {
    EnvFilter::new(config.log_level.to_lowercase())
}

/// Install the global subscriber, JSON or plain text depending on `log_format`
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: &ReconcilerConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.log_format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}
