//! Database models for the billing ledger.
//!
//! These models use sqlx's FromRow derive for direct database deserialization.
//! Status columns are stored as text and converted through `TryFrom<String>`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Error raised when a stored status label is not recognised
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind} label: {label:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

/// Per-appointment payment label, derived from `amount_paid` vs `price`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Parcial")]
    Partial,
    #[serde(rename = "Pago")]
    Paid,
}

impl PaymentStatus {
    /// Label as persisted in `appointments.payment_status`
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pendente",
            PaymentStatus::Partial => "Parcial",
            PaymentStatus::Paid => "Pago",
        }
    }

    /// Pending and partial appointments still carry debt
    pub fn is_open(&self) -> bool {
        !matches!(self, PaymentStatus::Paid)
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = UnknownLabel;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        match label.as_str() {
            "Pendente" => Ok(PaymentStatus::Pending),
            "Parcial" => Ok(PaymentStatus::Partial),
            "Pago" => Ok(PaymentStatus::Paid),
            _ => Err(UnknownLabel {
                kind: "payment status",
                label,
            }),
        }
    }
}

/// Lifecycle of the visit itself (independent of payment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisitStatus {
    #[serde(rename = "Agendado")]
    Scheduled,
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl TryFrom<String> for VisitStatus {
    type Error = UnknownLabel;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        match label.as_str() {
            "Agendado" => Ok(VisitStatus::Scheduled),
            "confirmed" => Ok(VisitStatus::Confirmed),
            "cancelled" => Ok(VisitStatus::Cancelled),
            _ => Err(UnknownLabel {
                kind: "visit status",
                label,
            }),
        }
    }
}

/// Billable session from appointments
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_paid: Decimal,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    #[sqlx(try_from = "String")]
    pub status: VisitStatus,
}

impl Appointment {
    /// Amount still owed on this appointment (never negative)
    pub fn debt(&self) -> Decimal {
        (self.price - self.amount_paid).max(Decimal::ZERO)
    }
}

/// Patient from patients
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub credit_balance: Decimal,
}

/// Appointment joined with the patient's contact fields (finance listing)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct LedgerEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
    pub patient_phone: Option<String>,
}

/// Locked view of one patient's ledger, handed to settlement planners
#[derive(Debug, Clone)]
pub struct PatientLedger {
    pub patient: Patient,
    /// All of the patient's appointments, ordered by (start_time, id)
    pub appointments: Vec<Appointment>,
}
