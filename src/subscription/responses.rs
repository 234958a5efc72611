//! Response DTOs for subscription API endpoints.

use serde::Serialize;
use uuid::Uuid;

use crate::billing::responses::MoneyResponse;

use super::gate::{AccountStatusCard, RouteAccess, SubscriptionStatus, TrialBanner};
use super::models::PlanType;
use super::revenue::PlatformRevenue;
use super::services::{AccessOverview, SubscriptionOverview};

#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub status: SubscriptionStatus,
    pub patient_count: i64,
    pub account_card: Option<AccountStatusCard>,
}

impl SubscriptionStatusResponse {
    pub fn new(user_id: Uuid, overview: SubscriptionOverview) -> Self {
        Self {
            user_id,
            status: overview.status,
            patient_count: overview.patient_count,
            account_card: overview.card,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    #[serde(flatten)]
    pub access: RouteAccess,
    /// Where the client should navigate instead of the dashboard
    pub redirect: Option<&'static str>,
    pub banner: Option<TrialBanner>,
}

impl From<AccessOverview> for AccessResponse {
    fn from(overview: AccessOverview) -> Self {
        let redirect = match overview.access {
            RouteAccess::RedirectToLogin => Some("/login"),
            _ => None,
        };
        Self {
            access: overview.access,
            redirect,
            banner: overview.banner,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub user_id: Uuid,
    pub plan_type: PlanType,
}

#[derive(Debug, Serialize)]
pub struct RevenueResponse {
    pub active_professionals: i64,
    pub plan_price: MoneyResponse,
    pub monthly_revenue: MoneyResponse,
    pub annual_projection: MoneyResponse,
}

impl From<PlatformRevenue> for RevenueResponse {
    fn from(r: PlatformRevenue) -> Self {
        Self {
            active_professionals: r.active_professionals,
            plan_price: r.plan_price.into(),
            monthly_revenue: r.monthly_revenue.into(),
            annual_projection: r.annual_projection.into(),
        }
    }
}
