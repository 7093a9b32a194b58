//! # Pass Outcome
//!
//! Every reconciliation pass ends with exactly one call to
//! [`manage_error`](ReconcilerBase::manage_error) or
//! [`manage_success`](ReconcilerBase::manage_success). Both record the outcome on the
//! object's reconcile status (when it tracks one) and decide when the pass runs again.
//!
//! Neither call fails. A business error becomes a warning event, the status reason and
//! a requeue delay. A status write failure becomes a fixed retry of one backoff unit.

use super::{ReconcileResult, ReconcilerBase};
use crate::constants::{PROCESSING_ERROR_ACTION, PROCESSING_ERROR_REASON};
use crate::crd::ReconcileStatus;
use crate::events::EventSeverity;
use crate::observability::metrics;
use crate::resource::{object_reference, ManagedObject};
use tracing::{debug, error, field, instrument, warn, Span};

impl ReconcilerBase {
    /// Record a failed pass and compute the requeue delay
    ///
    /// The delay is `min(2 * seed, max)` where the seed is one unit after a success or
    /// with no status history, and otherwise the time since the previous failure.
    #[instrument(parent = &self.span, skip_all, fields(resource = field::Empty))]
    pub async fn manage_error<M, E>(&self, obj: &mut M, err: &E) -> ReconcileResult
    where
        M: ManagedObject + ?Sized,
        E: std::fmt::Display + Sync + ?Sized,
    {
        let message = err.to_string();
        let reference = match object_reference(&*obj) {
            Ok(reference) => reference,
            Err(e) => {
                error!("Unable to record error {:?}: {}", message, e);
                return ReconcileResult::done();
            }
        };
        Span::current().record(
            "resource",
            field::display(reference.name.as_deref().unwrap_or_default()),
        );
        warn!("Reconciliation failed: {}", message);

        self.notifier
            .notify(
                &reference,
                EventSeverity::Warning,
                PROCESSING_ERROR_REASON,
                PROCESSING_ERROR_ACTION,
                &message,
            )
            .await;

        let now = self.clock.now();
        let previous = self.read_status(&*obj);
        if previous.is_some() {
            if let Err(e) = self
                .write_status(obj, ReconcileStatus::failure(now, message.as_str()))
                .await
            {
                error!("Unable to record failure status, retrying shortly: {}", e);
                return self.finish("status_error", self.backoff.base());
            }
        } else {
            debug!("Object does not track a reconcile status, using base backoff");
        }

        let delay = self.backoff.next_delay(now, previous.as_ref());
        self.finish("error", delay)
    }

    /// Record a successful pass
    ///
    /// Returns an empty result unless the success status could not be written.
    #[instrument(parent = &self.span, skip_all, fields(resource = field::Empty))]
    pub async fn manage_success<M>(&self, obj: &mut M) -> ReconcileResult
    where
        M: ManagedObject + ?Sized,
    {
        let reference = match object_reference(&*obj) {
            Ok(reference) => reference,
            Err(e) => {
                error!("Unable to record success: {}", e);
                return ReconcileResult::done();
            }
        };
        Span::current().record(
            "resource",
            field::display(reference.name.as_deref().unwrap_or_default()),
        );

        if obj.reconcile_status_aware().is_none() {
            metrics::record_reconcile_result("success");
            return ReconcileResult::done();
        }

        let now = self.clock.now();
        if let Err(e) = self.write_status(obj, ReconcileStatus::success(now)).await {
            error!("Unable to record success status, retrying shortly: {}", e);
            return self.finish("status_error", self.backoff.base());
        }
        debug!("Reconciliation succeeded");
        metrics::record_reconcile_result("success");
        ReconcileResult::done()
    }

    fn finish(&self, outcome: &str, delay: std::time::Duration) -> ReconcileResult {
        metrics::record_reconcile_result(outcome);
        metrics::observe_requeue_delay(delay.as_secs_f64());
        debug!("Requeueing after {:?}", delay);
        ReconcileResult::requeue_after(delay)
    }
}
