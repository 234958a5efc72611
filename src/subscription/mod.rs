//! Subscription and access gate.
//!
//! Derives trial state, effective plan and patient-creation capability for a
//! professional, the dashboard lockout, and the platform revenue projection.

pub mod gate;
pub mod memory;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod revenue;
pub mod routes;
pub mod services;
pub mod store;

pub use gate::{
    evaluate_route_access, get_subscription_status, LockoutPolicy, RouteAccess, SubscriptionStatus,
    TrialPolicy,
};
pub use memory::MemoryAccountStore;
pub use models::{AccessRecord, AuthUser, CurrentPlan, PlanType, Profile};
pub use routes::{admin_router, router};
pub use services::{SubscriptionError, SubscriptionService};
pub use store::{AccountStore, PgAccountStore};
