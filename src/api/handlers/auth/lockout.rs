//! Failed-attempt counting and exponential login lockout.
//!
//! The state machine per user is `Unlocked` / `Locked(until)`. While locked,
//! attempts are rejected before any password hash comparison so the lockout
//! window cannot be used as a timing oracle. From the fifth consecutive
//! failure onward, each further failure locks for `2^(count-5)` minutes; a
//! success resets the counter and clears the lock. There is no manual unlock.

/// Consecutive failures before lockout starts.
pub(super) const LOCKOUT_THRESHOLD: i32 = 5;

const LOCKOUT_BASE_SECONDS: i64 = 60;
// 2^20 minutes is roughly two years; further doubling only risks overflow.
const MAX_LOCKOUT_EXPONENT: i32 = 20;

/// Whether a login attempt may proceed to password verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Gate {
    Open,
    Locked { retry_after_seconds: i64 },
}

/// Gate an attempt against the stored lockout timestamp.
pub(super) fn gate(locked_until_unix: Option<i64>, now_unix: i64) -> Gate {
    match locked_until_unix {
        Some(until) if now_unix < until => Gate::Locked {
            retry_after_seconds: until - now_unix,
        },
        _ => Gate::Open,
    }
}

/// Apply a failed attempt: returns the new counter and, once the threshold is
/// reached, the new `locked_until` timestamp.
pub(super) fn penalize(failed_count: i32, now_unix: i64) -> (i32, Option<i64>) {
    let new_count = failed_count.saturating_add(1);
    if new_count < LOCKOUT_THRESHOLD {
        return (new_count, None);
    }
    let exponent = (new_count - LOCKOUT_THRESHOLD).min(MAX_LOCKOUT_EXPONENT);
    let duration = LOCKOUT_BASE_SECONDS.saturating_mul(1_i64 << exponent);
    (new_count, Some(now_unix.saturating_add(duration)))
}

/// Remaining wait reported to the caller, in whole minutes (at least one).
pub(super) fn wait_minutes(retry_after_seconds: i64) -> i64 {
    (retry_after_seconds.max(1) + 59) / 60
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn gate_open_without_lockout() {
        assert_eq!(gate(None, NOW), Gate::Open);
        assert_eq!(gate(Some(NOW - 1), NOW), Gate::Open);
        assert_eq!(gate(Some(NOW), NOW), Gate::Open);
    }

    #[test]
    fn gate_locked_reports_remaining_wait() {
        assert_eq!(
            gate(Some(NOW + 90), NOW),
            Gate::Locked {
                retry_after_seconds: 90
            }
        );
    }

    #[test]
    fn penalties_below_threshold_do_not_lock() {
        for count in 0..LOCKOUT_THRESHOLD - 1 {
            let (new_count, locked_until) = penalize(count, NOW);
            assert_eq!(new_count, count + 1);
            assert_eq!(locked_until, None);
        }
    }

    #[test]
    fn fifth_failure_locks_for_one_minute() {
        let (count, locked_until) = penalize(4, NOW);
        assert_eq!(count, 5);
        assert_eq!(locked_until, Some(NOW + 60));
    }

    #[test]
    fn lockout_duration_doubles_per_failure() {
        // 5th -> 1 min, 6th -> 2 min, 7th -> 4 min, ...
        let mut previous = 0;
        for count in 4..12 {
            let (_, locked_until) = penalize(count, NOW);
            let duration = locked_until.expect("locked") - NOW;
            assert_eq!(duration, 60_i64 << (count - 4), "count {count}");
            assert!(duration > previous);
            previous = duration;
        }
    }

    #[test]
    fn lockout_is_monotonic_while_failures_continue() {
        // Simulate: fail through lockouts, each retry happening after the
        // previous window elapsed. locked_until must never decrease.
        let mut now = NOW;
        let mut count = 0;
        let mut last_until = 0;
        for _ in 0..10 {
            assert_eq!(gate((last_until > 0).then_some(last_until), now), Gate::Open);
            let (new_count, locked_until) = penalize(count, now);
            count = new_count;
            if let Some(until) = locked_until {
                assert!(until >= last_until);
                last_until = until;
                now = until; // wait out the window before the next attempt
            }
        }
        assert_eq!(count, 10);
    }

    #[test]
    fn exponent_is_capped() {
        let (_, locked_until) = penalize(i32::MAX - 1, NOW);
        let duration = locked_until.expect("locked") - NOW;
        assert_eq!(duration, LOCKOUT_BASE_SECONDS << MAX_LOCKOUT_EXPONENT);
    }

    #[test]
    fn wait_minutes_rounds_up_and_floors_at_one() {
        assert_eq!(wait_minutes(1), 1);
        assert_eq!(wait_minutes(60), 1);
        assert_eq!(wait_minutes(61), 2);
        assert_eq!(wait_minutes(119), 2);
        assert_eq!(wait_minutes(120), 2);
    }
}
