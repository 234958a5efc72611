//! HTTP surface tests using in-memory stores.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use mentepsi_ledger::billing::{Appointment, MemoryLedgerStore, Patient, PaymentStatus, VisitStatus};
use mentepsi_ledger::config::Config;
use mentepsi_ledger::extractor::USER_ID_HEADER;
use mentepsi_ledger::subscription::{AuthUser, MemoryAccountStore, Profile};
use mentepsi_ledger::{app, AppState};

const PATIENT: u128 = 1;
const APPOINTMENT: u128 = 10;
const USER: u128 = 50;

async fn test_app() -> Router {
    let ledger = Arc::new(MemoryLedgerStore::new());
    ledger
        .insert_patient(Patient {
            id: Uuid::from_u128(PATIENT),
            user_id: Uuid::from_u128(USER),
            full_name: "Lucas Pereira".to_string(),
            phone: None,
            credit_balance: dec!(0),
        })
        .await;
    ledger
        .insert_appointment(Appointment {
            id: Uuid::from_u128(APPOINTMENT),
            patient_id: Uuid::from_u128(PATIENT),
            start_time: Utc.with_ymd_and_hms(2025, 4, 2, 9, 0, 0).unwrap(),
            price: dec!(200),
            amount_paid: dec!(0),
            payment_status: PaymentStatus::Pending,
            status: VisitStatus::Confirmed,
        })
        .await;

    let accounts = Arc::new(MemoryAccountStore::new());
    let created = Utc::now() - Duration::days(2);
    accounts
        .insert_profile(Profile {
            id: Uuid::from_u128(USER),
            trial_started_at: Some(created),
            plan_type: None,
            created_at: Some(created),
        })
        .await;
    accounts
        .insert_user(AuthUser {
            id: Uuid::from_u128(USER),
            email: "lucas.psi@example.com".to_string(),
            created_at: created,
        })
        .await;
    accounts.set_active_professionals(3).await;

    app(AppState::new(ledger, accounts, &Config::default()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header(USER_ID_HEADER, Uuid::from_u128(USER).to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_as(uri: &str, user: u128) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(USER_ID_HEADER, Uuid::from_u128(user).to_string())
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    get_as(uri, USER)
}

#[tokio::test]
async fn health_responds_ok() {
    let response = test_app().await.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_payment_returns_partial_status() {
    let uri = format!("/api/billing/appointments/{}/payments", Uuid::from_u128(APPOINTMENT));
    let (status, body) = send(test_app().await, json_request("POST", &uri, serde_json::json!({ "amount": "80" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["payment_status"], "Parcial");
    assert_eq!(body["appointment"]["amount_paid"], "80");
}

#[tokio::test]
async fn invalid_amount_is_rejected() {
    let uri = format!("/api/billing/patients/{}/payments", Uuid::from_u128(PATIENT));
    let (status, body) = send(test_app().await, json_request("POST", &uri, serde_json::json!({ "amount": "abc" }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "invalid_amount");
}

#[tokio::test]
async fn batch_payment_reports_credit() {
    let uri = format!("/api/billing/patients/{}/payments", Uuid::from_u128(PATIENT));
    let (status, body) = send(
        test_app().await,
        json_request("POST", &uri, serde_json::json!({ "amount": "250.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settlement"]["credit_added"]["amount"], "50.00");
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let uri = format!("/api/billing/appointments/{}/receipt", Uuid::from_u128(999));
    let (status, body) = send(test_app().await, get(&uri)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "not_found");
}

#[tokio::test]
async fn subscription_status_for_trial_user() {
    let uri = format!("/api/subscription/{}", Uuid::from_u128(USER));
    let (status, body) = send(test_app().await, get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_plan"], "Trial");
    assert_eq!(body["can_create_patient"], true);
    assert_eq!(body["account_card"]["kind"], "trial");
}

#[tokio::test]
async fn access_without_session_redirects() {
    let uri = format!("/api/subscription/{}/access", Uuid::from_u128(4242));
    let (status, body) = send(test_app().await, get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access"], "redirect_to_login");
    assert_eq!(body["redirect"], "/login");
}

#[tokio::test]
async fn set_plan_returns_stored_plan() {
    let app = test_app().await;
    let uri = format!("/api/subscription/{}/plan", Uuid::from_u128(USER));
    let (status, body) = send(app, json_request("PUT", &uri, serde_json::json!({ "plan_type": "Free" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan_type"], "Free");
}

#[tokio::test]
async fn admin_revenue_uses_default_price() {
    let (status, body) = send(test_app().await, get("/api/admin/revenue")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_professionals"], 3);
    assert_eq!(body["monthly_revenue"]["amount"], "149.70");
    assert_eq!(body["monthly_revenue"]["currency"], "BRL");
}

#[tokio::test]
async fn unknown_route_is_json_not_found() {
    let (status, body) = send(test_app().await, get("/api/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "not_found");
}

#[tokio::test]
async fn billing_requires_caller_identity() {
    let request = Request::builder().uri("/api/billing/ledger").body(Body::empty()).unwrap();
    let (status, body) = send(test_app().await, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_type"], "unauthorized");
}

#[tokio::test]
async fn other_professional_cannot_reach_patient() {
    const OTHER: u128 = 51;
    let summary = format!("/api/billing/patients/{}/summary", Uuid::from_u128(PATIENT));
    let (status, _) = send(test_app().await, get(&summary)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(test_app().await, get_as(&summary, OTHER)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "not_found");

    let receipt = format!("/api/billing/appointments/{}/receipt", Uuid::from_u128(APPOINTMENT));
    let (status, _) = send(test_app().await, get_as(&receipt, OTHER)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(test_app().await, get_as("/api/billing/ledger", OTHER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"], serde_json::json!([]));
}

#[tokio::test]
async fn cache_can_be_flushed() {
    let app = test_app().await;
    let uri = format!("/api/subscription/{}", Uuid::from_u128(USER));
    let (status, _) = send(app.clone(), get(&uri)).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method("POST")
        .uri("/api/cache/invalidate")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["profiles_size"].is_u64());
}
