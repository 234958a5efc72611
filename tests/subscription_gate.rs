//! Subscription gate over the in-memory account store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

use mentepsi_ledger::cache::AppCache;
use mentepsi_ledger::subscription::gate::AccountStatusCard;
use mentepsi_ledger::subscription::{
    AccessRecord, AuthUser, CurrentPlan, LockoutPolicy, MemoryAccountStore, Profile, RouteAccess,
    SubscriptionService, TrialPolicy,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 10, 16, 30, 0).unwrap()
}

fn service(store: Arc<MemoryAccountStore>) -> SubscriptionService {
    SubscriptionService::new(
        store,
        AppCache::default(),
        TrialPolicy::default(),
        LockoutPolicy::default(),
        dec!(49.90),
    )
}

async fn professional(store: &MemoryAccountStore, id: Uuid, days_ago: i64, plan: Option<&str>, patients: i64) {
    let started = now() - Duration::days(days_ago);
    store
        .insert_profile(Profile {
            id,
            trial_started_at: Some(started),
            plan_type: plan.map(str::to_string),
            created_at: Some(started),
        })
        .await;
    store
        .insert_user(AuthUser {
            id,
            email: format!("{}@example.com", id),
            created_at: started,
        })
        .await;
    store.set_patient_count(id, patients).await;
}

#[tokio::test]
async fn trial_user_may_create_patients() {
    let store = Arc::new(MemoryAccountStore::new());
    let id = Uuid::from_u128(1);
    professional(&store, id, 5, None, 12).await;
    let svc = service(store);

    let overview = svc.status(id, now()).await.unwrap();
    assert_eq!(overview.status.current_plan, CurrentPlan::Trial);
    assert_eq!(overview.status.days_remaining, 10);
    assert!(overview.status.can_create_patient);
    assert!(matches!(overview.card, Some(AccountStatusCard::Trial { day: 5, of: 15, .. })));
}

#[tokio::test]
async fn expired_free_user_is_capped_at_three_patients() {
    let store = Arc::new(MemoryAccountStore::new());
    let capped = Uuid::from_u128(2);
    let below = Uuid::from_u128(3);
    professional(&store, capped, 20, Some("Free"), 3).await;
    professional(&store, below, 20, Some("Free"), 2).await;
    let svc = service(store);

    assert!(!svc.can_create_patient(capped, now()).await.unwrap());
    assert!(svc.can_create_patient(below, now()).await.unwrap());

    let overview = svc.status(capped, now()).await.unwrap();
    assert!(matches!(
        overview.card,
        Some(AccountStatusCard::Free {
            limit: 3,
            limit_reached: true,
            ..
        })
    ));
}

#[tokio::test]
async fn missing_profile_denies_creation() {
    let svc = service(Arc::new(MemoryAccountStore::new()));
    let overview = svc.status(Uuid::from_u128(77), now()).await.unwrap();
    assert!(overview.status.is_expired);
    assert!(!overview.status.can_create_patient);
    assert_eq!(overview.status.current_plan, CurrentPlan::Free);
}

#[tokio::test]
async fn upgrading_lifts_the_cap_immediately() {
    let store = Arc::new(MemoryAccountStore::new());
    let id = Uuid::from_u128(4);
    professional(&store, id, 40, Some("Free"), 8).await;
    let svc = service(store);

    assert!(!svc.can_create_patient(id, now()).await.unwrap());
    svc.set_plan_type(id, "Pro").await.unwrap();
    assert!(svc.can_create_patient(id, now()).await.unwrap());
}

#[tokio::test]
async fn route_guard_locks_after_thirty_days_unless_active() {
    let store = Arc::new(MemoryAccountStore::new());
    let locked = Uuid::from_u128(5);
    let paying = Uuid::from_u128(6);
    professional(&store, locked, 31, None, 0).await;
    professional(&store, paying, 31, Some("Pro"), 0).await;
    store
        .insert_access_record(
            paying,
            AccessRecord {
                created_at: None,
                subscription_status: Some("active".to_string()),
                selected_plan: Some("Profissional".to_string()),
            },
        )
        .await;
    let svc = service(store);

    let overview = svc.route_access(locked, now()).await.unwrap();
    assert_eq!(overview.access, RouteAccess::Blocked { days_since_created: 31 });
    assert!(overview.banner.is_none());

    let overview = svc.route_access(paying, now()).await.unwrap();
    assert_eq!(
        overview.access,
        RouteAccess::Granted {
            days_since_created: 31,
            is_paid: true
        }
    );
}

#[tokio::test]
async fn gates_disagree_between_day_sixteen_and_thirty() {
    let store = Arc::new(MemoryAccountStore::new());
    let id = Uuid::from_u128(8);
    professional(&store, id, 20, None, 3).await;
    let svc = service(store);

    let status = svc.status(id, now()).await.unwrap().status;
    let access = svc.route_access(id, now()).await.unwrap();

    assert!(status.is_expired);
    assert!(!status.can_create_patient);
    assert!(!access.access.is_blocked());
    let banner = access.banner.unwrap();
    assert_eq!(banner.remaining_days, 10);
    assert_eq!(banner.plan_name, "Profissional");
}
