//! Subscription and admin route handlers

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::requests::SetPlanRequest;
use super::responses::{AccessResponse, PlanResponse, RevenueResponse, SubscriptionStatusResponse};

/// Subscription API, mounted under `/api/subscription`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(status))
        .route("/:user_id/access", get(access))
        .route("/:user_id/plan", put(set_plan))
}

/// Admin API, mounted under `/api/admin`
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/revenue", get(revenue))
}

async fn status(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SubscriptionStatusResponse>> {
    let overview = state.subscription.status(user_id, Utc::now()).await?;
    Ok(Json(SubscriptionStatusResponse::new(user_id, overview)))
}

async fn access(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> Result<Json<AccessResponse>> {
    let overview = state.subscription.route_access(user_id, Utc::now()).await?;
    Ok(Json(overview.into()))
}

async fn set_plan(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetPlanRequest>,
) -> Result<Json<PlanResponse>> {
    let plan_type = state.subscription.set_plan_type(user_id, &req.plan_type).await?;
    Ok(Json(PlanResponse { user_id, plan_type }))
}

async fn revenue(State(state): State<AppState>) -> Result<Json<RevenueResponse>> {
    let revenue = state.subscription.platform_revenue().await?;
    Ok(Json(revenue.into()))
}
