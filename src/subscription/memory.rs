//! In-memory account store for tests and local runs without Postgres.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{AccessRecord, AuthUser, PlanType, Profile};
use super::services::SubscriptionError;
use super::store::AccountStore;

#[derive(Debug, Default)]
struct AccountState {
    profiles: HashMap<Uuid, Profile>,
    users: HashMap<Uuid, AuthUser>,
    access: HashMap<Uuid, AccessRecord>,
    patient_counts: HashMap<Uuid, i64>,
    active_professionals: i64,
    plan_price: Option<Decimal>,
}

#[derive(Default)]
pub struct MemoryAccountStore {
    state: RwLock<AccountState>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.state.write().await.profiles.insert(profile.id, profile);
    }

    pub async fn insert_user(&self, user: AuthUser) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn insert_access_record(&self, user_id: Uuid, record: AccessRecord) {
        self.state.write().await.access.insert(user_id, record);
    }

    pub async fn set_patient_count(&self, user_id: Uuid, count: i64) {
        self.state.write().await.patient_counts.insert(user_id, count);
    }

    pub async fn set_active_professionals(&self, count: i64) {
        self.state.write().await.active_professionals = count;
    }

    pub async fn set_plan_price(&self, price: Option<Decimal>) {
        self.state.write().await.plan_price = price;
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, SubscriptionError> {
        Ok(self.state.read().await.profiles.get(&user_id).cloned())
    }

    async fn patient_count(&self, user_id: Uuid) -> Result<i64, SubscriptionError> {
        Ok(self
            .state
            .read()
            .await
            .patient_counts
            .get(&user_id)
            .copied()
            .unwrap_or(0))
    }

    async fn auth_user(&self, user_id: Uuid) -> Result<Option<AuthUser>, SubscriptionError> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn access_record(&self, user_id: Uuid) -> Result<Option<AccessRecord>, SubscriptionError> {
        Ok(self.state.read().await.access.get(&user_id).cloned())
    }

    async fn set_plan_type(&self, user_id: Uuid, plan: PlanType) -> Result<(), SubscriptionError> {
        let mut state = self.state.write().await;
        state
            .profiles
            .entry(user_id)
            .or_insert_with(|| Profile {
                id: user_id,
                trial_started_at: None,
                plan_type: None,
                created_at: None,
            })
            .plan_type = Some(plan.as_str().to_string());
        Ok(())
    }

    async fn active_professional_count(&self) -> Result<i64, SubscriptionError> {
        Ok(self.state.read().await.active_professionals)
    }

    async fn professional_plan_price(&self) -> Result<Option<Decimal>, SubscriptionError> {
        Ok(self.state.read().await.plan_price)
    }
}
