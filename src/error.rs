//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::billing::BillingError;
use crate::subscription::SubscriptionError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found".to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            AppError::Billing(err) => match err {
                BillingError::InvalidAmount(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "invalid_amount", err.to_string())
                }
                BillingError::AppointmentNotFound(_) | BillingError::PatientNotFound(_) => {
                    (StatusCode::NOT_FOUND, "not_found", err.to_string())
                }
                BillingError::StoreWriteFailure(e) => {
                    tracing::error!("Store write failure: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "store_write_failure",
                        "The payment could not be saved; no changes were applied".to_string(),
                    )
                }
                BillingError::Database(e) => {
                    tracing::error!("Database error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "database", "Database error".to_string())
                }
            },
            AppError::Subscription(err) => match err {
                SubscriptionError::UnknownPlan(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "unknown_plan", err.to_string())
                }
                SubscriptionError::Database(e) => {
                    tracing::error!("Database error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "database", "Database error".to_string())
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.parts();

        let body = ErrorResponse {
            error_type: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
