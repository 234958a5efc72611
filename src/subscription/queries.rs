//! Database queries for accounts, plans and platform settings.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{AccessRecord, AuthUser, PlanType, Profile};

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, trial_started_at, plan_type, created_at
        FROM profiles
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Patients owned by a professional
pub async fn count_patients(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM patients WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

pub async fn get_auth_user(pool: &PgPool, user_id: Uuid) -> Result<Option<AuthUser>, sqlx::Error> {
    sqlx::query_as::<_, AuthUser>(
        r#"
        SELECT id, email, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Route-guard fields of a profile
pub async fn get_access_record(pool: &PgPool, user_id: Uuid) -> Result<Option<AccessRecord>, sqlx::Error> {
    sqlx::query_as::<_, AccessRecord>(
        r#"
        SELECT created_at, subscription_status, selected_plan
        FROM profiles
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Insert or update the stored plan of a professional
pub async fn upsert_plan_type(pool: &PgPool, user_id: Uuid, plan: PlanType) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO profiles (id, plan_type)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET plan_type = EXCLUDED.plan_type
        "#,
    )
    .bind(user_id)
    .bind(plan.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn count_active_professionals(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM user_roles
        WHERE role = 'professional' AND status = 'active'
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Configured price of the professional plan, if any
pub async fn get_professional_plan_price(pool: &PgPool) -> Result<Option<Decimal>, sqlx::Error> {
    let row: Option<(Option<Decimal>,)> = sqlx::query_as(
        r#"
        SELECT plan_professional FROM global_settings
        ORDER BY id
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|(price,)| price))
}
