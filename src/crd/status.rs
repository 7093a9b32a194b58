//! # Reconcile Status
//!
//! Status snapshot recorded on resources that opt into reconcile status tracking.
//! The same record drives the requeue backoff, so there is no separate failure counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the last reconciliation pass
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema,
)]
pub enum ReconcileOutcome {
    Success,
    Failure,
    /// No pass has completed yet, or the stored value is not recognised
    #[default]
    #[serde(other)]
    Unknown,
}

impl ReconcileOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Success => "Success",
            ReconcileOutcome::Failure => "Failure",
            ReconcileOutcome::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status snapshot of the last reconciliation pass
///
/// Embed this in a CRD status (usually as `reconcileStatus`) and implement
/// [`ReconcileStatusAware`] to opt into status-driven backoff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStatus {
    /// Time of the last status transition (RFC3339)
    /// Unset until the first pass records a result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    /// Human-readable reason; the error message on failure, empty on success
    #[serde(default)]
    pub reason: String,
    /// Outcome of the last pass
    #[serde(default)]
    pub status: ReconcileOutcome,
}

impl ReconcileStatus {
    #[must_use]
    pub fn success(now: DateTime<Utc>) -> Self {
        Self {
            last_update: Some(now),
            reason: String::new(),
            status: ReconcileOutcome::Success,
        }
    }

    #[must_use]
    pub fn failure(now: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            last_update: Some(now),
            reason: reason.into(),
            status: ReconcileOutcome::Failure,
        }
    }
}

/// Capability implemented by resources whose status carries a [`ReconcileStatus`]
///
/// Resources expose it through
/// [`ManagedObject::reconcile_status_aware`](crate::resource::ManagedObject::reconcile_status_aware).
pub trait ReconcileStatusAware {
    /// Current snapshot; a resource with no status yet returns the default (`Unknown`)
    fn reconcile_status(&self) -> ReconcileStatus;

    fn set_reconcile_status(&mut self, status: ReconcileStatus);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_serializes_camel_case() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let status = ReconcileStatus::failure(now, "disk full");

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["lastUpdate"], "2024-05-01T12:00:00Z");
        assert_eq!(value["reason"], "disk full");
        assert_eq!(value["status"], "Failure");
    }

    #[test]
    fn test_status_defaults_when_fields_missing() {
        let status: ReconcileStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(status, ReconcileStatus::default());
        assert!(status.last_update.is_none());
        assert_eq!(status.status, ReconcileOutcome::Unknown);
    }

    #[test]
    fn test_unrecognised_outcome_is_unknown() {
        let status: ReconcileStatus =
            serde_json::from_str(r#"{"reason":"","status":"Degraded"}"#).unwrap();
        assert_eq!(status.status, ReconcileOutcome::Unknown);
    }

    #[test]
    fn test_success_clears_reason() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let status = ReconcileStatus::success(now);
        assert_eq!(status.reason, "");
        assert_eq!(status.status.to_string(), "Success");
        assert_eq!(status.last_update, Some(now));
    }
}
