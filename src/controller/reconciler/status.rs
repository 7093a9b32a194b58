//! # Status Tracking
//!
//! Reads and persists the [`ReconcileStatus`] of objects that opt into the status
//! capability. Objects without it are simply not tracked.

use super::ReconcilerBase;
use crate::crd::ReconcileStatus;
use crate::error::ReconcileError;
use crate::observability::metrics;
use crate::resource::{adopt_stored_identity, to_dynamic, ManagedObject};
use tracing::{debug, warn};

impl ReconcilerBase {
    /// Current status snapshot, `None` when `obj` does not track one
    #[must_use]
    pub fn read_status<M: ManagedObject + ?Sized>(&self, obj: &M) -> Option<ReconcileStatus> {
        obj.reconcile_status_aware().map(|aware| aware.reconcile_status())
    }

    /// Set `status` on `obj` and persist it through the status subresource
    ///
    /// Store failures are reported as [`ReconcileError::StatusPersist`]. On success the
    /// new `resourceVersion` is copied back onto `obj`.
    pub async fn write_status<M: ManagedObject + ?Sized>(
        &self,
        obj: &mut M,
        status: ReconcileStatus,
    ) -> Result<(), ReconcileError> {
        let Some(aware) = obj.reconcile_status_aware_mut() else {
            return Err(ReconcileError::TypeMismatch(
                "object does not track a reconcile status".to_string(),
            ));
        };
        debug!(
            "Recording reconcile status {} ({})",
            status.status, status.reason
        );
        aware.set_reconcile_status(status);

        let dynamic = to_dynamic(&*obj)?;
        let stored = self.store.update_status(&dynamic).await.map_err(|e| {
            warn!("Unable to persist reconcile status: {}", e);
            metrics::increment_status_write_failures();
            ReconcileError::StatusPersist(e)
        })?;
        adopt_stored_identity(obj, &stored.metadata);
        Ok(())
    }
}
