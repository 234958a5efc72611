//! Request DTOs for billing API endpoints.
//!
//! Amounts arrive as text and go through `parse_amount`, so a malformed value
//! becomes `InvalidAmount` rather than a deserialization rejection.

use chrono::NaiveDate;
use serde::Deserialize;

use super::calculators::LedgerTab;

/// Request to register a payment against one appointment
#[derive(Debug, Deserialize)]
pub struct RegisterPaymentRequest {
    pub amount: String,
}

/// Request to settle a patient payment across open appointments
#[derive(Debug, Deserialize)]
pub struct BatchPaymentRequest {
    pub amount: String,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

/// Finance listing query string
#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    #[serde(default)]
    pub tab: LedgerTab,
    #[serde(default)]
    pub search: Option<String>,
}

/// Receipt query string
#[derive(Debug, Default, Deserialize)]
pub struct ReceiptQuery {
    #[serde(default)]
    pub issued_on: Option<NaiveDate>,
}
