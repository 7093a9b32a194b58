//! # Constants
//!
//! Shared constants used throughout the reconciler helpers.
//!
//! These values represent the default requeue policy and can be overridden via
//! configuration or environment variables where applicable.

/// Default backoff unit (seconds)
/// Used as the seed after a success or with no prior status, and as the fixed retry
/// when the status subresource cannot be written
pub const DEFAULT_BACKOFF_BASE_SECS: u64 = 1;

/// Default backoff ceiling (seconds): 6 hours
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 6 * 60 * 60;

/// Multiplier applied to the backoff seed on every failure
pub const BACKOFF_GROWTH_FACTOR: u32 = 2;

/// Default event reporter (controller name shown on published events)
pub const DEFAULT_EVENT_REPORTER: &str = "reconcile-utils";

/// Event reason attached to every business error passed to `manage_error`
pub const PROCESSING_ERROR_REASON: &str = "ProcessingError";

/// Event action attached to every business error passed to `manage_error`
pub const PROCESSING_ERROR_ACTION: &str = "Reconcile";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Default log format (json, text)
pub const DEFAULT_LOG_FORMAT: &str = "json";
