//! Database models for accounts and plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanType {
    Free,
    Pro,
}

impl PlanType {
    /// Read a stored `plan_type` label.
    ///
    /// "Free" (any case) is the free tier, blank means no plan on record and
    /// any other label is a paid tier.
    pub fn parse(label: &str) -> Option<PlanType> {
        let label = label.trim();
        if label.is_empty() {
            None
        } else if label.eq_ignore_ascii_case("free") {
            Some(PlanType::Free)
        } else {
            Some(PlanType::Pro)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Free => "Free",
            PlanType::Pro => "Pro",
        }
    }
}

/// Derived access tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CurrentPlan {
    Trial,
    Free,
    Pro,
}

impl From<PlanType> for CurrentPlan {
    fn from(plan: PlanType) -> Self {
        match plan {
            PlanType::Free => CurrentPlan::Free,
            PlanType::Pro => CurrentPlan::Pro,
        }
    }
}

/// Professional account from profiles
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub trial_started_at: Option<DateTime<Utc>>,
    pub plan_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn plan(&self) -> Option<PlanType> {
        self.plan_type.as_deref().and_then(PlanType::parse)
    }
}

/// Identity as reported by the auth provider
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Fields read by the dashboard route guard
#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct AccessRecord {
    pub created_at: Option<DateTime<Utc>>,
    pub subscription_status: Option<String>,
    pub selected_plan: Option<String>,
}
