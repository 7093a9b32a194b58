//! # Reconciler
//!
//! Building blocks for a level-triggered reconciliation pass.
//!
//! A concrete controller embeds a [`ReconcilerBase`] and, for every pass:
//!
//! 1. Converges the objects it manages with the synchronization operations
//!    (`create_or_update_resource`, `create_resource_if_not_exists`, `delete_resource`
//!    and their batch and templated forms)
//! 2. Ends with exactly one call to `manage_error` or `manage_success`, which records
//!    the outcome on the reconcile status and yields the [`ReconcileResult`] handed back
//!    to the scheduler
//!
//! ## Modules
//!
//! - `types`: `ReconcilerBase`, its collaborators and the validation hooks
//! - `sync`: idempotent create/update/delete of single objects and ordered batches
//! - `status`: reconcile status read/write
//! - `manage`: pass outcome handling and status-driven requeue delays
//! - `templated`: synchronization of objects rendered from a manifest template
//! - `result`: the scheduler-facing result and its conversion into an `Action`

pub mod manage;
pub mod result;
pub mod status;
pub mod sync;
pub mod templated;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use result::ReconcileResult;
pub use types::{ReconcileHooks, ReconcilerBase};
