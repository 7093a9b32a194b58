//! # Status-Driven Backoff
//!
//! Computes how long to wait before the next reconciliation after a failure.
//!
//! There is no failure counter. The seed is the wall-clock time elapsed since the
//! previous recorded transition, read back from the resource's [`ReconcileStatus`], and
//! every failure doubles it up to a ceiling:
//!
//! - no previous transition, or previous outcome `Success`: seed = base (1s)
//! - otherwise: seed = `now - previous.last_update`, rounded to whole seconds
//! - delay = `min(2 * seed, max)` (max 6h)
//!
//! A pass re-invoked exactly when its delay expires therefore waits 2s, 4s, 8s, ...
//! A pass re-invoked early (for example by a watch event) sees a smaller elapsed time,
//! so the seed shrinks and growth flattens. That follows from using the status record
//! as the only backoff state.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{Duration as ChronoDuration, TimeZone, Utc};
//! use reconcile_utils::controller::backoff::StatusBackoff;
//! use reconcile_utils::crd::ReconcileStatus;
//! use std::time::Duration;
//!
//! let backoff = StatusBackoff::default();
//! let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
//!
//! // First failure
//! assert_eq!(backoff.next_delay(now, None), Duration::from_secs(2));
//!
//! // Failure recorded 4 seconds ago
//! let previous = ReconcileStatus::failure(now - ChronoDuration::seconds(4), "disk full");
//! assert_eq!(backoff.next_delay(now, Some(&previous)), Duration::from_secs(8));
//! ```

use crate::config::ReconcilerConfig;
use crate::constants::{BACKOFF_GROWTH_FACTOR, DEFAULT_BACKOFF_BASE_SECS, DEFAULT_BACKOFF_MAX_SECS};
use crate::crd::{ReconcileOutcome, ReconcileStatus};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Elapsed time is rounded to this unit before doubling
const ROUNDING_UNIT: Duration = Duration::from_secs(1);

/// Backoff calculator over persisted reconcile status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBackoff {
    /// Seed after success or with no history, and the fixed status-write retry
    base: Duration,
    /// Ceiling for any computed delay
    max: Duration,
}

impl Default for StatusBackoff {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_BACKOFF_BASE_SECS),
            Duration::from_secs(DEFAULT_BACKOFF_MAX_SECS),
        )
    }
}

impl StatusBackoff {
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    #[must_use]
    pub fn from_config(config: &ReconcilerConfig) -> Self {
        Self::new(config.backoff_base(), config.backoff_max())
    }

    #[must_use]
    pub fn base(&self) -> Duration {
        self.base
    }

    #[must_use]
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Pre-doubling seed derived from the previous status snapshot
    #[must_use]
    pub fn seed(&self, now: DateTime<Utc>, previous: &ReconcileStatus) -> Duration {
        match previous.last_update {
            None => self.base,
            Some(_) if previous.status == ReconcileOutcome::Success => self.base,
            Some(last_update) => round_to_unit(now - last_update, ROUNDING_UNIT),
        }
    }

    /// Delay for a given seed: `min(2 * seed, max)`
    #[must_use]
    pub fn delay(&self, seed: Duration) -> Duration {
        seed.saturating_mul(BACKOFF_GROWTH_FACTOR).min(self.max)
    }

    /// Delay after a failure; `previous` is `None` for resources without status
    #[must_use]
    pub fn next_delay(&self, now: DateTime<Utc>, previous: Option<&ReconcileStatus>) -> Duration {
        let seed = previous.map_or(self.base, |p| self.seed(now, p));
        self.delay(seed)
    }
}

/// Round to the nearest multiple of `unit`, halves away from zero
///
/// Negative elapsed time (the previous timestamp is ahead of this clock) becomes zero.
fn round_to_unit(elapsed: chrono::Duration, unit: Duration) -> Duration {
    let Ok(elapsed) = elapsed.to_std() else {
        return Duration::ZERO;
    };
    let unit_nanos = unit.as_nanos();
    if unit_nanos == 0 {
        return elapsed;
    }
    let nanos = elapsed.as_nanos();
    let remainder = nanos % unit_nanos;
    let rounded = if remainder * 2 < unit_nanos {
        nanos - remainder
    } else {
        nanos + (unit_nanos - remainder)
    };
    u64::try_from(rounded).map_or(Duration::MAX, Duration::from_nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn failure_ago(elapsed: ChronoDuration) -> ReconcileStatus {
        ReconcileStatus::failure(now() - elapsed, "boom")
    }

    #[test]
    fn test_first_failure_uses_base() {
        let backoff = StatusBackoff::default();
        assert_eq!(backoff.next_delay(now(), None), Duration::from_secs(2));
        assert_eq!(
            backoff.next_delay(now(), Some(&ReconcileStatus::default())),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_failure_after_success_resets_seed() {
        let backoff = StatusBackoff::default();
        let previous = ReconcileStatus::success(now() - ChronoDuration::hours(1));
        assert_eq!(backoff.seed(now(), &previous), Duration::from_secs(1));
        assert_eq!(
            backoff.next_delay(now(), Some(&previous)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_failure_after_failure_doubles_elapsed() {
        let backoff = StatusBackoff::default();
        for secs in [2_i64, 4, 8, 30, 600] {
            let previous = failure_ago(ChronoDuration::seconds(secs));
            assert_eq!(
                backoff.next_delay(now(), Some(&previous)),
                Duration::from_secs(u64::try_from(secs * 2).unwrap()),
                "elapsed {secs}s"
            );
        }
    }

    #[test]
    fn test_unknown_outcome_with_timestamp_uses_elapsed() {
        let backoff = StatusBackoff::default();
        let previous = ReconcileStatus {
            last_update: Some(now() - ChronoDuration::seconds(10)),
            reason: String::new(),
            status: ReconcileOutcome::Unknown,
        };
        assert_eq!(
            backoff.next_delay(now(), Some(&previous)),
            Duration::from_secs(20)
        );
    }

    #[test]
    fn test_delay_is_capped_at_six_hours() {
        let backoff = StatusBackoff::default();
        let six_hours = Duration::from_secs(6 * 60 * 60);
        for elapsed in [
            ChronoDuration::hours(3),
            ChronoDuration::hours(3) + ChronoDuration::seconds(1),
            ChronoDuration::hours(5),
            ChronoDuration::days(30),
        ] {
            let previous = failure_ago(elapsed);
            assert_eq!(backoff.next_delay(now(), Some(&previous)), six_hours);
        }
    }

    #[test]
    fn test_just_under_three_hours_is_not_capped() {
        let backoff = StatusBackoff::default();
        let previous = failure_ago(ChronoDuration::hours(3) - ChronoDuration::seconds(1));
        assert_eq!(
            backoff.next_delay(now(), Some(&previous)),
            Duration::from_secs(2 * (3 * 60 * 60 - 1))
        );
    }

    #[test]
    fn test_elapsed_is_rounded_to_whole_seconds() {
        let backoff = StatusBackoff::default();
        let cases = [
            (1_400, 1),
            (1_500, 2),
            (2_499, 2),
            (2_500, 3),
            (499, 0),
        ];
        for (millis, seed_secs) in cases {
            let previous = failure_ago(ChronoDuration::milliseconds(millis));
            assert_eq!(
                backoff.seed(now(), &previous),
                Duration::from_secs(seed_secs),
                "elapsed {millis}ms"
            );
        }
    }

    #[test]
    fn test_previous_timestamp_in_future_collapses_to_zero() {
        let backoff = StatusBackoff::default();
        let previous = ReconcileStatus::failure(now() + ChronoDuration::seconds(30), "skew");
        assert_eq!(backoff.seed(now(), &previous), Duration::ZERO);
        assert_eq!(backoff.next_delay(now(), Some(&previous)), Duration::ZERO);
    }

    // Known quirk: the seed is the elapsed time, not a counter. Re-invoking before the
    // delay expires shrinks the seed, so the requeue delay collapses instead of growing.
    #[test]
    fn test_early_reinvocation_flattens_growth() {
        let backoff = StatusBackoff::default();

        // On schedule: 2s, 4s, 8s, 16s
        let mut delay = backoff.next_delay(now(), None);
        let mut expected = vec![Duration::from_secs(2)];
        let mut last = now();
        for _ in 0..3 {
            let at = last + ChronoDuration::from_std(delay).unwrap();
            let previous = ReconcileStatus::failure(last, "boom");
            delay = backoff.next_delay(at, Some(&previous));
            expected.push(delay);
            last = at;
        }
        assert_eq!(
            expected,
            [2, 4, 8, 16].map(Duration::from_secs).to_vec()
        );

        // A watch event 1s after a failure that asked for 16s
        let previous = ReconcileStatus::failure(last, "boom");
        let early = backoff.next_delay(last + ChronoDuration::seconds(1), Some(&previous));
        assert_eq!(early, Duration::from_secs(2));

        // Two failures within the same half second
        let instant = backoff.next_delay(
            last + ChronoDuration::milliseconds(200),
            Some(&previous),
        );
        assert_eq!(instant, Duration::ZERO);
    }

    #[test]
    fn test_custom_base_and_max() {
        let backoff = StatusBackoff::new(Duration::from_secs(5), Duration::from_secs(60));
        assert_eq!(backoff.next_delay(now(), None), Duration::from_secs(10));
        let previous = failure_ago(ChronoDuration::seconds(45));
        assert_eq!(
            backoff.next_delay(now(), Some(&previous)),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_from_config() {
        let config = ReconcilerConfig {
            backoff_base_secs: 3,
            backoff_max_secs: 90,
            ..ReconcilerConfig::default()
        };
        let backoff = StatusBackoff::from_config(&config);
        assert_eq!(backoff.base(), Duration::from_secs(3));
        assert_eq!(backoff.max(), Duration::from_secs(90));
    }
}
