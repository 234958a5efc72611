//! Request DTOs for subscription API endpoints.

use serde::Deserialize;

/// Request to switch a professional's plan
#[derive(Debug, Deserialize)]
pub struct SetPlanRequest {
    pub plan_type: String,
}
