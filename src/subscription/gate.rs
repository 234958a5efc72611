//! Access gate calculations.
//!
//! Two independent gates live here and must not be merged:
//! - the fine-grained gate (`get_subscription_status`) anchors on the trial
//!   start, counts partial days as whole days and caps patients on Free;
//! - the coarse route guard (`evaluate_route_access`) anchors on account
//!   creation, counts whole days only and locks the dashboard unless the
//!   stored subscription status is `active`.
//!
//! Everything is recomputed on every read; nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{AccessRecord, AuthUser, CurrentPlan, Profile};

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Settings of the fine-grained gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialPolicy {
    pub trial_length_days: i64,
    pub free_patient_limit: i64,
}

impl Default for TrialPolicy {
    fn default() -> Self {
        Self {
            trial_length_days: 15,
            free_patient_limit: 3,
        }
    }
}

/// Settings of the coarse route guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub lockout_after_days: i64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            lockout_after_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscriptionStatus {
    pub days_remaining: i64,
    pub is_expired: bool,
    pub can_create_patient: bool,
    pub current_plan: CurrentPlan,
}

impl SubscriptionStatus {
    /// Used when no profile exists: deny rather than grant
    pub fn most_restrictive() -> Self {
        Self {
            days_remaining: 0,
            is_expired: true,
            can_create_patient: false,
            current_plan: CurrentPlan::Free,
        }
    }
}

/// Trial start, falling back to account creation and then to `now`
pub fn trial_anchor(profile: &Profile, now: DateTime<Utc>) -> DateTime<Utc> {
    profile.trial_started_at.or(profile.created_at).unwrap_or(now)
}

/// Days between two instants, partial days rounded up
pub fn days_elapsed_ceil(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - start).num_milliseconds().abs();
    (millis + DAY_MILLIS - 1) / DAY_MILLIS
}

/// Whole days between two instants, partial days dropped
pub fn whole_days_between(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_days().abs()
}

/// Derive trial state, effective plan and the patient-creation capability
pub fn get_subscription_status(
    profile: Option<&Profile>,
    patient_count: i64,
    now: DateTime<Utc>,
    policy: &TrialPolicy,
) -> SubscriptionStatus {
    let Some(profile) = profile else {
        return SubscriptionStatus::most_restrictive();
    };

    let days_elapsed = days_elapsed_ceil(trial_anchor(profile, now), now);
    let is_expired = days_elapsed > policy.trial_length_days;
    let days_remaining = (policy.trial_length_days - days_elapsed).max(0);

    let current_plan = if is_expired {
        profile.plan().map(CurrentPlan::from).unwrap_or(CurrentPlan::Free)
    } else {
        CurrentPlan::Trial
    };

    let can_create_patient =
        !is_expired || current_plan != CurrentPlan::Free || patient_count < policy.free_patient_limit;

    SubscriptionStatus {
        days_remaining,
        is_expired,
        can_create_patient,
        current_plan,
    }
}

/// Outcome of the dashboard route guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum RouteAccess {
    RedirectToLogin,
    Blocked { days_since_created: i64 },
    Granted { days_since_created: i64, is_paid: bool },
}

impl RouteAccess {
    pub fn is_blocked(&self) -> bool {
        !matches!(self, RouteAccess::Granted { .. })
    }
}

/// Stored subscription status, `trial` when none is recorded
pub fn subscription_status_label(record: Option<&AccessRecord>) -> &str {
    record
        .and_then(|r| r.subscription_status.as_deref())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("trial")
}

/// Decide whether the dashboard renders or is replaced by the lockout overlay
pub fn evaluate_route_access(
    user: Option<&AuthUser>,
    record: Option<&AccessRecord>,
    now: DateTime<Utc>,
    policy: &LockoutPolicy,
) -> RouteAccess {
    let Some(user) = user else {
        return RouteAccess::RedirectToLogin;
    };

    let created_at = record.and_then(|r| r.created_at).unwrap_or(user.created_at);
    let days_since_created = whole_days_between(created_at, now);
    let is_expired = days_since_created > policy.lockout_after_days;
    let is_paid = subscription_status_label(record) == "active";

    if is_expired && !is_paid {
        RouteAccess::Blocked { days_since_created }
    } else {
        RouteAccess::Granted {
            days_since_created,
            is_paid,
        }
    }
}

pub const DEFAULT_BANNER_PLAN: &str = "Profissional";

/// Countdown banner shown while the route-guard window is open
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialBanner {
    pub plan_name: String,
    pub remaining_days: i64,
    pub progress_percent: f64,
    pub urgent: bool,
}

/// Build the countdown banner, or `None` once the window has closed
pub fn trial_banner(
    created_at: DateTime<Utc>,
    plan_name: Option<&str>,
    now: DateTime<Utc>,
    policy: &LockoutPolicy,
) -> Option<TrialBanner> {
    let window = policy.lockout_after_days;
    let days_used = whole_days_between(created_at, now);
    let remaining_days = (window - days_used).max(0);

    if remaining_days <= 0 {
        return None;
    }

    let progress_percent = if window > 0 {
        (days_used as f64 / window as f64 * 100.0).clamp(0.0, 100.0)
    } else {
        100.0
    };

    Some(TrialBanner {
        plan_name: plan_name
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_BANNER_PLAN)
            .to_string(),
        remaining_days,
        progress_percent,
        urgent: remaining_days < 5,
    })
}

/// Sidebar card on the patient pages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountStatusCard {
    Trial {
        day: i64,
        of: i64,
        days_remaining: i64,
        progress_percent: f64,
    },
    Free {
        patient_count: i64,
        limit: i64,
        progress_percent: f64,
        limit_reached: bool,
    },
}

/// Card for the current state; paid plans get none
pub fn account_status_card(
    status: &SubscriptionStatus,
    patient_count: i64,
    policy: &TrialPolicy,
) -> Option<AccountStatusCard> {
    if !status.is_expired {
        let of = policy.trial_length_days;
        let day = of - status.days_remaining;
        let progress_percent = if of > 0 { day as f64 / of as f64 * 100.0 } else { 100.0 };
        return Some(AccountStatusCard::Trial {
            day,
            of,
            days_remaining: status.days_remaining,
            progress_percent,
        });
    }

    if status.current_plan == CurrentPlan::Free {
        let limit = policy.free_patient_limit;
        let progress_percent = if limit > 0 {
            (patient_count as f64 / limit as f64 * 100.0).min(100.0)
        } else {
            100.0
        };
        return Some(AccountStatusCard::Free {
            patient_count,
            limit,
            progress_percent,
            limit_reached: patient_count >= limit,
        });
    }

    None
}
