//! Failed-login lockout.
//!
//! Two states, computed from the subject rather than stored:
//!
//! - **Active**: no lockout, or the lockout window has passed.
//! - **Locked**: `lockout_until` is set and `now < lockout_until`.
//!
//! Only a successful login resets the failure counter. Time passing ends a
//! lockout but leaves `failed_login_attempts` where it was, so a subject that
//! hit the threshold is locked again by its next failure.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::subject::Subject;

/// Threshold and window for one entity type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failures (counted since the last success) that trigger a lockout.
    pub threshold: u32,
    /// Window length, starting at the triggering failure.
    pub duration: Duration,
}

impl LockoutPolicy {
    pub fn new(threshold: u32, duration: Duration) -> Self {
        Self { threshold, duration }
    }

    /// Admin accounts: 5 failures, 15 minutes.
    pub fn admin() -> Self {
        Self::new(5, Duration::minutes(15))
    }

    /// Member accounts: 5 failures, 30 minutes.
    pub fn member() -> Self {
        Self::new(5, Duration::minutes(30))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoginState {
    Active,
    Locked { until: DateTime<Utc> },
}

pub fn is_locked_out(subject: &Subject, now: DateTime<Utc>) -> bool {
    matches!(login_state(subject, now), LoginState::Locked { .. })
}

pub fn login_state(subject: &Subject, now: DateTime<Utc>) -> LoginState {
    match subject.lockout_until {
        Some(until) if now < until => LoginState::Locked { until },
        _ => LoginState::Active,
    }
}

/// Apply one login outcome and return the updated subject.
///
/// The caller must persist the result before evaluating the next attempt for
/// the same subject (see `login::LoginCoordinator`). A window reaching past
/// the representable range locks until `DateTime::<Utc>::MAX_UTC`.
pub fn record_attempt(
    mut subject: Subject,
    success: bool,
    now: DateTime<Utc>,
    policy: &LockoutPolicy,
) -> Subject {
    if success {
        subject.failed_login_attempts = 0;
        subject.lockout_until = None;
        subject.last_login_at = Some(now);
        return subject;
    }

    subject.failed_login_attempts = subject.failed_login_attempts.saturating_add(1);
    if subject.failed_login_attempts >= policy.threshold {
        let until = now
            .checked_add_signed(policy.duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        subject.lockout_until = Some(until);
        tracing::warn!(
            subject_id = %subject.id,
            failed_attempts = subject.failed_login_attempts,
            lockout_until = %until,
            "account locked after repeated login failures"
        );
    }
    subject
}

#[cfg(test)]
mod tests {
    use super::*;
    use masthead_core::{RoleId, SubjectId};

    fn subject() -> Subject {
        Subject::new(SubjectId::new(), "kim@example.com", "Kim", RoleId::new())
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn fail_n(mut s: Subject, n: u32, now: DateTime<Utc>, policy: &LockoutPolicy) -> Subject {
        for _ in 0..n {
            s = record_attempt(s, false, now, policy);
        }
        s
    }

    #[test]
    fn new_subject_is_active() {
        let s = subject();
        assert_eq!(login_state(&s, t0()), LoginState::Active);
        assert_eq!(s.failed_login_attempts, 0);
    }

    #[test]
    fn locks_on_threshold_not_before() {
        let policy = LockoutPolicy::admin();
        let s = fail_n(subject(), 4, t0(), &policy);
        assert!(!is_locked_out(&s, t0()));
        assert_eq!(s.lockout_until, None);

        let s = record_attempt(s, false, t0(), &policy);
        assert!(is_locked_out(&s, t0()));
        assert_eq!(s.lockout_until, Some(t0() + Duration::minutes(15)));
    }

    #[test]
    fn lock_holds_until_window_ends() {
        let policy = LockoutPolicy::admin();
        let s = fail_n(subject(), 5, t0(), &policy);
        let until = t0() + Duration::minutes(15);

        assert!(is_locked_out(&s, until - Duration::seconds(1)));
        assert!(!is_locked_out(&s, until));
        assert!(!is_locked_out(&s, until + Duration::hours(1)));
    }

    #[test]
    fn member_policy_locks_for_thirty_minutes() {
        let policy = LockoutPolicy::member();
        let s = fail_n(subject(), 5, t0(), &policy);
        assert_eq!(
            login_state(&s, t0()),
            LoginState::Locked { until: t0() + Duration::minutes(30) }
        );
    }

    #[test]
    fn success_resets_everything() {
        let policy = LockoutPolicy::admin();
        let s = fail_n(subject(), 5, t0(), &policy);
        let later = t0() + Duration::minutes(20);

        let s = record_attempt(s, true, later, &policy);
        assert_eq!(s.failed_login_attempts, 0);
        assert_eq!(s.lockout_until, None);
        assert_eq!(s.last_login_at, Some(later));
        assert!(!is_locked_out(&s, later));
    }

    #[test]
    fn failures_do_not_touch_last_login() {
        let policy = LockoutPolicy::admin();
        let s = record_attempt(subject(), true, t0(), &policy);
        let s = record_attempt(s, false, t0() + Duration::minutes(1), &policy);
        assert_eq!(s.last_login_at, Some(t0()));
    }

    #[test]
    fn counter_survives_expired_lockout() {
        let policy = LockoutPolicy::admin();
        let s = fail_n(subject(), 5, t0(), &policy);
        let after = t0() + Duration::minutes(16);
        assert!(!is_locked_out(&s, after));

        // The very next failure re-locks; time alone never resets the counter.
        let s = record_attempt(s, false, after, &policy);
        assert_eq!(s.failed_login_attempts, 6);
        assert_eq!(s.lockout_until, Some(after + Duration::minutes(15)));
    }

    #[test]
    fn success_between_bursts_keeps_subject_one_short() {
        let policy = LockoutPolicy::admin();
        let mut s = subject();
        for _ in 0..3 {
            s = fail_n(s, 4, t0(), &policy);
            assert!(!is_locked_out(&s, t0()));
            s = record_attempt(s, true, t0(), &policy);
        }
        assert_eq!(s.failed_login_attempts, 0);
    }

    #[test]
    fn oversized_window_saturates_instead_of_overflowing() {
        let policy = LockoutPolicy::new(1, Duration::MAX);
        let s = record_attempt(subject(), false, t0(), &policy);
        assert_eq!(s.lockout_until, Some(DateTime::<Utc>::MAX_UTC));
        assert!(is_locked_out(&s, t0() + Duration::days(365 * 100)));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Locked right after the k-th failure iff k >= threshold.
            #[test]
            fn lock_iff_threshold_reached(threshold in 1u32..10, failures in 0u32..20) {
                let policy = LockoutPolicy::new(threshold, Duration::minutes(15));
                let s = fail_n(subject(), failures, t0(), &policy);
                prop_assert_eq!(is_locked_out(&s, t0()), failures >= threshold);
                prop_assert_eq!(s.failed_login_attempts, failures);
            }
        }
    }
}
