//! # Controller
//!
//! Reconciliation helpers for controllers built on `kube`.
//!
//! - `backoff`: status-driven exponential requeue backoff
//! - `reconciler`: `ReconcilerBase`, resource synchronization and pass outcome handling
//! - `templates`: Handlebars manifest templates rendered into resources

pub mod backoff;
pub mod reconciler;
pub mod templates;
