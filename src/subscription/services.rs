//! Subscription service functions with store access.
//!
//! The gates are evaluated from fresh inputs on every call; only the profile
//! row and the plan price are served from cache.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::AppCache;

use super::gate::{
    account_status_card, evaluate_route_access, get_subscription_status, trial_banner,
    AccountStatusCard, LockoutPolicy, RouteAccess, SubscriptionStatus, TrialBanner, TrialPolicy,
};
use super::models::{PlanType, Profile};
use super::revenue::{platform_revenue, PlatformRevenue};
use super::store::AccountStore;

/// Subscription error types
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Unknown plan '{0}'")]
    UnknownPlan(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fine-grained gate plus the sidebar card
#[derive(Debug, Clone)]
pub struct SubscriptionOverview {
    pub status: SubscriptionStatus,
    pub patient_count: i64,
    pub card: Option<AccountStatusCard>,
}

/// Route guard plus the countdown banner
#[derive(Debug, Clone)]
pub struct AccessOverview {
    pub access: RouteAccess,
    pub banner: Option<TrialBanner>,
}

#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn AccountStore>,
    cache: AppCache,
    trial: TrialPolicy,
    lockout: LockoutPolicy,
    default_plan_price: Decimal,
}

impl SubscriptionService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        cache: AppCache,
        trial: TrialPolicy,
        lockout: LockoutPolicy,
        default_plan_price: Decimal,
    ) -> Self {
        Self {
            store,
            cache,
            trial,
            lockout,
            default_plan_price,
        }
    }

    async fn cached_profile(&self, user_id: Uuid) -> Result<Option<Arc<Profile>>, SubscriptionError> {
        if let Some(profile) = self.cache.profiles.get(&user_id).await {
            debug!("Profile cache hit: {}", user_id);
            return Ok(Some(profile));
        }

        let Some(profile) = self.store.profile(user_id).await? else {
            return Ok(None);
        };
        let profile = Arc::new(profile);
        self.cache.profiles.insert(user_id, profile.clone()).await;
        Ok(Some(profile))
    }

    /// Evaluate the patient-creation gate for a professional
    pub async fn status(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<SubscriptionOverview, SubscriptionError> {
        let profile = self.cached_profile(user_id).await?;
        if profile.is_none() {
            warn!("No profile for user {}, applying most restrictive status", user_id);
        }
        let patient_count = self.store.patient_count(user_id).await?;

        let status = get_subscription_status(profile.as_deref(), patient_count, now, &self.trial);
        let card = account_status_card(&status, patient_count, &self.trial);

        Ok(SubscriptionOverview {
            status,
            patient_count,
            card,
        })
    }

    /// Whether the professional may register another patient right now
    pub async fn can_create_patient(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<bool, SubscriptionError> {
        Ok(self.status(user_id, now).await?.status.can_create_patient)
    }

    /// Evaluate the dashboard route guard and the countdown banner
    pub async fn route_access(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<AccessOverview, SubscriptionError> {
        let user = self.store.auth_user(user_id).await?;
        let Some(user) = user else {
            return Ok(AccessOverview {
                access: RouteAccess::RedirectToLogin,
                banner: None,
            });
        };
        let record = self.store.access_record(user_id).await?;

        let access = evaluate_route_access(Some(&user), record.as_ref(), now, &self.lockout);
        let created_at = record.as_ref().and_then(|r| r.created_at).unwrap_or(user.created_at);
        let plan_name = record.as_ref().and_then(|r| r.selected_plan.as_deref());
        let banner = trial_banner(created_at, plan_name, now, &self.lockout);

        if access.is_blocked() {
            info!("Dashboard locked for user {}", user_id);
        }

        Ok(AccessOverview { access, banner })
    }

    /// Store a new plan for the professional
    pub async fn set_plan_type(&self, user_id: Uuid, label: &str) -> Result<PlanType, SubscriptionError> {
        let plan = PlanType::parse(label).ok_or_else(|| SubscriptionError::UnknownPlan(label.to_string()))?;
        self.store.set_plan_type(user_id, plan).await?;
        self.cache.invalidate_profile(user_id).await;

        info!("Plan for user {} set to {}", user_id, plan.as_str());
        Ok(plan)
    }

    async fn plan_price(&self) -> Result<Decimal, SubscriptionError> {
        if let Some(price) = self.cache.plan_price().await {
            return Ok(price);
        }

        let price = self
            .store
            .professional_plan_price()
            .await?
            .unwrap_or(self.default_plan_price);
        self.cache.set_plan_price(price).await;
        Ok(price)
    }

    /// Load the plan price into the cache ahead of the first admin request
    pub async fn warm_cache(&self) {
        self.cache.settings.invalidate_all();
        match self.plan_price().await {
            Ok(price) => info!("Plan price cached: {}", price),
            Err(e) => warn!("Failed to warm plan price cache: {}", e),
        }
    }

    pub async fn platform_revenue(&self) -> Result<PlatformRevenue, SubscriptionError> {
        let active = self.store.active_professional_count().await?;
        let price = self.plan_price().await?;
        Ok(platform_revenue(active, price))
    }
}
