//! # Configuration
//!
//! Runtime configuration for the reconciler helpers.
//!
//! - `reconciler`: backoff, event reporter and logging settings loaded from the environment

pub mod reconciler;

pub use reconciler::ReconcilerConfig;
