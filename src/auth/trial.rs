//! Trial-window arithmetic.
//!
//! Pure functions over a trial expiry and an injected `now`; nothing here
//! touches storage or the wall clock. A null expiry means "no trial
//! restriction" and admins bypass expiry everywhere.

use chrono::{DateTime, Duration, Utc};

use crate::api::models::users::Role;

/// Remaining trial days for an account.
///
/// `Unbounded` is the sentinel for accounts without a trial expiry; it is
/// never conflated with a numeric day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialDays {
    Unbounded,
    Days(i64),
}

impl TrialDays {
    /// Numeric day count, or None for unbounded accounts.
    pub fn days(&self) -> Option<i64> {
        match self {
            TrialDays::Unbounded => None,
            TrialDays::Days(n) => Some(*n),
        }
    }
}

/// Whole days left until `trial_until`, clamped to zero.
pub fn remaining_days(trial_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TrialDays {
    match trial_until {
        None => TrialDays::Unbounded,
        Some(until) => TrialDays::Days((until - now).num_days().max(0)),
    }
}

/// Whether the trial window has closed.
///
/// Always false for admins regardless of `trial_until`, and false for
/// accounts without a trial bound.
pub fn is_expired(trial_until: Option<DateTime<Utc>>, now: DateTime<Utc>, role: Role) -> bool {
    if role == Role::Admin {
        return false;
    }
    match trial_until {
        None => false,
        Some(until) => now > until,
    }
}

/// New trial expiry after an extension of `days`.
///
/// Computed from `now`, not from the current expiry: an extension replaces
/// the remaining window rather than stacking on top of it. Returns None when
/// `days` would put the expiry outside the representable range.
pub fn extend(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    now.checked_add_signed(Duration::try_days(days)?)
}
