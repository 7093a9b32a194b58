//! # Reconciler Configuration
//!
//! Reconciler-level settings loaded from environment variables.

use std::time::Duration;

/// Reconciler-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are usually populated from a ConfigMap using `envFrom`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Backoff unit (seconds)
    /// Seed after success or with no prior status, and the fixed retry on status write failure
    pub backoff_base_secs: u64,
    /// Backoff ceiling (seconds)
    pub backoff_max_secs: u64,
    /// Controller name recorded as the reporter of published events
    pub event_reporter: String,
    /// Optional reporter instance (usually the pod name)
    pub event_reporter_instance: Option<String>,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            backoff_base_secs: DEFAULT_BACKOFF_BASE_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            event_reporter: DEFAULT_EVENT_REPORTER.to_string(),
            event_reporter_instance: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: DEFAULT_LOG_FORMAT.to_string(),
            enable_metrics: true,
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            // A zero unit or ceiling would turn every requeue into a hot loop
            backoff_base_secs: env_var_nonzero_or_default(
                "RECONCILE_BACKOFF_BASE_SECS",
                DEFAULT_BACKOFF_BASE_SECS,
            ),
            backoff_max_secs: env_var_nonzero_or_default(
                "RECONCILE_BACKOFF_MAX_SECS",
                DEFAULT_BACKOFF_MAX_SECS,
            ),
            event_reporter: env_var_or_default_str("EVENT_REPORTER", DEFAULT_EVENT_REPORTER),
            event_reporter_instance: std::env::var("EVENT_REPORTER_INSTANCE")
                .ok()
                .filter(|v| !v.is_empty()),
            log_level: env_var_or_default_str("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            log_format: env_var_or_default_str("LOG_FORMAT", DEFAULT_LOG_FORMAT),
            enable_metrics: env_var_or_default_bool("ENABLE_METRICS", true),
        }
    }

    /// Backoff unit as a `Duration`
    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs(self.backoff_base_secs)
    }

    /// Backoff ceiling as a `Duration`
    #[must_use]
    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs)
    }
}

/// Read environment variable or return default
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as a positive number or return default
fn env_var_nonzero_or_default(key: &str, default: u64) -> u64 {
    match env_var_or_default(key, default) {
        0 => default,
        value => value,
    }
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
