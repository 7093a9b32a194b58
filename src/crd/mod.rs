//! # Custom Resource Types
//!
//! Status types that custom resources embed to take part in status-driven requeue.

pub mod status;

pub use status::{ReconcileOutcome, ReconcileStatus, ReconcileStatusAware};
