//! MentePsi billing ledger and subscription gate.
//!
//! `billing` reconciles patient payments against appointments; `subscription`
//! decides what a professional may do based on trial and plan. Both sit behind
//! store traits with Postgres and in-memory implementations.

pub mod billing;
pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod subscription;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use billing::{BillingService, LedgerStore};
use cache::{AppCache, CacheStats};
use config::Config;
use error::AppError;
use subscription::{AccountStore, SubscriptionService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub billing: BillingService,
    pub subscription: SubscriptionService,
    pub cache: AppCache,
}

impl AppState {
    pub fn new(ledger: Arc<dyn LedgerStore>, accounts: Arc<dyn AccountStore>, config: &Config) -> Self {
        let cache = AppCache::new(config.profile_cache_ttl);
        Self {
            billing: BillingService::new(ledger, config.overpayment).with_utc_offset(config.utc_offset),
            subscription: SubscriptionService::new(
                accounts,
                cache.clone(),
                config.trial,
                config.lockout,
                config.default_plan_price,
            ),
            cache,
        }
    }
}

/// Build the HTTP application
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/cache/stats", get(cache_stats))
        .route("/api/cache/invalidate", post(invalidate_cache))
        .nest("/api/billing", billing::router())
        .nest("/api/subscription", subscription::router())
        .nest("/api/admin", subscription::admin_router())
        .fallback(not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Drop cached profiles and settings, e.g. after editing them directly in the database
async fn invalidate_cache(State(state): State<AppState>) -> Json<CacheStats> {
    state.cache.invalidate_all();
    Json(state.cache.stats())
}
