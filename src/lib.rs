//! Reconcile Utils
//!
//! Helpers for level-triggered Kubernetes controllers: idempotent resource
//! synchronization against the API server and a requeue backoff derived from the
//! reconcile status recorded on each resource.
//!
//! A controller embeds a [`ReconcilerBase`](controller::reconciler::ReconcilerBase),
//! converges its owned resources with the synchronization operations and finishes every
//! pass with `manage_error` or `manage_success`.

pub mod clock;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod discovery;
pub mod error;
pub mod events;
pub mod observability;
pub mod prelude;
pub mod resource;
pub mod store;
