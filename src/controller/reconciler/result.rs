//! # Reconcile Result
//!
//! What a pass hands back to the scheduler: whether to run again and the minimum
//! delay before doing so.

use kube_runtime::controller::Action;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileResult {
    pub requeue: bool,
    pub requeue_after: Duration,
}

impl ReconcileResult {
    /// Nothing to do until the next change
    #[must_use]
    pub fn done() -> Self {
        Self::default()
    }

    /// Run again after at least `delay`
    #[must_use]
    pub fn requeue_after(delay: Duration) -> Self {
        Self {
            requeue: true,
            requeue_after: delay,
        }
    }
}

impl From<ReconcileResult> for Action {
    fn from(result: ReconcileResult) -> Self {
        if result.requeue_after > Duration::ZERO {
            Action::requeue(result.requeue_after)
        } else if result.requeue {
            Action::requeue(Duration::ZERO)
        } else {
            Action::await_change()
        }
    }
}
