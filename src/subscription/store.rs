//! Account store seam.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{AccessRecord, AuthUser, PlanType, Profile};
use super::queries;
use super::services::SubscriptionError;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, SubscriptionError>;

    async fn patient_count(&self, user_id: Uuid) -> Result<i64, SubscriptionError>;

    /// Identity of a signed-in user, `None` when there is no session
    async fn auth_user(&self, user_id: Uuid) -> Result<Option<AuthUser>, SubscriptionError>;

    async fn access_record(&self, user_id: Uuid) -> Result<Option<AccessRecord>, SubscriptionError>;

    async fn set_plan_type(&self, user_id: Uuid, plan: PlanType) -> Result<(), SubscriptionError>;

    async fn active_professional_count(&self) -> Result<i64, SubscriptionError>;

    async fn professional_plan_price(&self) -> Result<Option<Decimal>, SubscriptionError>;
}

/// Postgres-backed account store
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, SubscriptionError> {
        Ok(queries::get_profile(&self.pool, user_id).await?)
    }

    async fn patient_count(&self, user_id: Uuid) -> Result<i64, SubscriptionError> {
        Ok(queries::count_patients(&self.pool, user_id).await?)
    }

    async fn auth_user(&self, user_id: Uuid) -> Result<Option<AuthUser>, SubscriptionError> {
        Ok(queries::get_auth_user(&self.pool, user_id).await?)
    }

    async fn access_record(&self, user_id: Uuid) -> Result<Option<AccessRecord>, SubscriptionError> {
        Ok(queries::get_access_record(&self.pool, user_id).await?)
    }

    async fn set_plan_type(&self, user_id: Uuid, plan: PlanType) -> Result<(), SubscriptionError> {
        Ok(queries::upsert_plan_type(&self.pool, user_id, plan).await?)
    }

    async fn active_professional_count(&self) -> Result<i64, SubscriptionError> {
        Ok(queries::count_active_professionals(&self.pool).await?)
    }

    async fn professional_plan_price(&self) -> Result<Option<Decimal>, SubscriptionError> {
        Ok(queries::get_professional_plan_price(&self.pool).await?)
    }
}
