//! Billing route handlers

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::extractor::Professional;
use crate::AppState;

use super::calculators::parse_amount;
use super::requests::{BatchPaymentRequest, LedgerQuery, ReceiptQuery, RegisterPaymentRequest};
use super::responses::{
    BatchPaymentResponse, DashboardResponse, LedgerResponse, MoneyResponse, PatientSummaryResponse,
    ReceiptResponse, SinglePaymentResponse,
};

/// Billing API, mounted under `/api/billing`.
///
/// Every handler acts for the `Professional` named by the request.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments/:id/payments", post(register_payment))
        .route("/appointments/:id/suggested-payment", get(suggested_payment))
        .route("/appointments/:id/receipt", get(receipt))
        .route("/patients/:id/payments", post(process_batch_payment))
        .route("/patients/:id/summary", get(patient_summary))
        .route("/ledger", get(ledger))
        .route("/dashboard", get(dashboard))
}

async fn register_payment(
    State(state): State<AppState>,
    caller: Professional,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<RegisterPaymentRequest>,
) -> Result<Json<SinglePaymentResponse>> {
    let amount = parse_amount(&req.amount)?;
    let result = state
        .billing
        .register_single_payment(caller.user_id, appointment_id, amount)
        .await?;
    Ok(Json(result.into()))
}

async fn suggested_payment(
    State(state): State<AppState>,
    caller: Professional,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<MoneyResponse>> {
    let amount = state.billing.suggested_payment(caller.user_id, appointment_id).await?;
    Ok(Json(amount.into()))
}

async fn receipt(
    State(state): State<AppState>,
    caller: Professional,
    Path(appointment_id): Path<Uuid>,
    Query(query): Query<ReceiptQuery>,
) -> Result<Json<ReceiptResponse>> {
    let issued_on = query.issued_on.unwrap_or_else(|| Utc::now().date_naive());
    let receipt = state.billing.receipt(caller.user_id, appointment_id, issued_on).await?;
    Ok(Json(receipt.into()))
}

async fn process_batch_payment(
    State(state): State<AppState>,
    caller: Professional,
    Path(patient_id): Path<Uuid>,
    Json(req): Json<BatchPaymentRequest>,
) -> Result<Json<BatchPaymentResponse>> {
    let amount = parse_amount(&req.amount)?;
    let payment_date = req.payment_date.unwrap_or_else(|| Utc::now().date_naive());
    let result = state
        .billing
        .process_batch_payment(caller.user_id, patient_id, amount, payment_date)
        .await?;
    Ok(Json(result.into()))
}

async fn patient_summary(
    State(state): State<AppState>,
    caller: Professional,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<PatientSummaryResponse>> {
    let summary = state.billing.patient_summary(caller.user_id, patient_id).await?;
    Ok(Json(PatientSummaryResponse::new(patient_id, summary)))
}

async fn ledger(
    State(state): State<AppState>,
    caller: Professional,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<LedgerResponse>> {
    let view = state
        .billing
        .ledger_view(caller.user_id, query.tab, query.search.as_deref())
        .await?;
    Ok(Json(view.into()))
}

async fn dashboard(State(state): State<AppState>, caller: Professional) -> Result<Json<DashboardResponse>> {
    let snapshot = state.billing.dashboard(caller.user_id, Utc::now()).await?;
    Ok(Json(snapshot.into()))
}
