//! Response DTOs for billing API endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::calculators::{Allocation, DashboardSnapshot, FinanceTotals, PatientAccountSummary, Settlement};
use super::models::{Appointment, LedgerEntry, PaymentStatus};
use super::receipts::PaymentReceipt;
use super::services::{BatchPaymentResult, LedgerView, SinglePaymentResult};

pub const CURRENCY: &str = "BRL";

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl From<Decimal> for MoneyResponse {
    fn from(amount: Decimal) -> Self {
        Self {
            amount,
            currency: CURRENCY.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AllocationResponse {
    pub appointment_id: Uuid,
    pub applied: MoneyResponse,
    pub amount_paid: MoneyResponse,
    pub payment_status: PaymentStatus,
}

impl From<&Allocation> for AllocationResponse {
    fn from(a: &Allocation) -> Self {
        Self {
            appointment_id: a.appointment_id,
            applied: a.applied.into(),
            amount_paid: a.amount_paid.into(),
            payment_status: a.payment_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub patient_id: Uuid,
    pub amount: MoneyResponse,
    pub allocations: Vec<AllocationResponse>,
    pub credit_added: MoneyResponse,
    pub discarded: MoneyResponse,
    pub credit_balance: MoneyResponse,
}

impl From<&Settlement> for SettlementResponse {
    fn from(s: &Settlement) -> Self {
        Self {
            patient_id: s.patient_id,
            amount: s.amount.into(),
            allocations: s.allocations.iter().map(AllocationResponse::from).collect(),
            credit_added: s.credit_added.into(),
            discarded: s.discarded.into(),
            credit_balance: s.credit_balance.into(),
        }
    }
}

/// Response for a single-appointment payment
#[derive(Debug, Serialize)]
pub struct SinglePaymentResponse {
    pub appointment: Appointment,
    pub settlement: SettlementResponse,
}

impl From<SinglePaymentResult> for SinglePaymentResponse {
    fn from(result: SinglePaymentResult) -> Self {
        Self {
            settlement: SettlementResponse::from(&result.settlement),
            appointment: result.appointment,
        }
    }
}

/// Response for a batch payment
#[derive(Debug, Serialize)]
pub struct BatchPaymentResponse {
    pub payment_date: NaiveDate,
    pub settlement: SettlementResponse,
    /// Human-readable outcome for the toast shown to the user
    pub message: String,
}

impl From<BatchPaymentResult> for BatchPaymentResponse {
    fn from(result: BatchPaymentResult) -> Self {
        let message = if result.settlement.credit_added > Decimal::ZERO {
            format!(
                "{} credited to the patient",
                super::receipts::format_brl(result.settlement.credit_added)
            )
        } else {
            "Sessions settled".to_string()
        };

        Self {
            payment_date: result.payment_date,
            settlement: SettlementResponse::from(&result.settlement),
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    pub paid: MoneyResponse,
    pub pending: MoneyResponse,
    pub total: MoneyResponse,
}

impl From<FinanceTotals> for TotalsResponse {
    fn from(t: FinanceTotals) -> Self {
        Self {
            paid: t.paid.into(),
            pending: t.pending.into(),
            total: t.total.into(),
        }
    }
}

/// Response for the finance listing
#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub entries: Vec<LedgerEntry>,
    pub totals: TotalsResponse,
}

impl From<LedgerView> for LedgerResponse {
    fn from(view: LedgerView) -> Self {
        Self {
            entries: view.entries,
            totals: view.totals.into(),
        }
    }
}

/// Response for the patient record summary
#[derive(Debug, Serialize)]
pub struct PatientSummaryResponse {
    pub patient_id: Uuid,
    pub debt: MoneyResponse,
    pub paid: MoneyResponse,
    pub credit: MoneyResponse,
    pub done: usize,
    pub scheduled: usize,
    pub cancelled: usize,
}

impl PatientSummaryResponse {
    pub fn new(patient_id: Uuid, summary: PatientAccountSummary) -> Self {
        Self {
            patient_id,
            debt: summary.debt.into(),
            paid: summary.paid.into(),
            credit: summary.credit.into(),
            done: summary.done,
            scheduled: summary.scheduled,
            cancelled: summary.cancelled,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub sessions_today: usize,
    pub monthly_revenue: MoneyResponse,
    pub pending_revenue: MoneyResponse,
}

impl From<DashboardSnapshot> for DashboardResponse {
    fn from(d: DashboardSnapshot) -> Self {
        Self {
            sessions_today: d.sessions_today,
            monthly_revenue: d.monthly_revenue.into(),
            pending_revenue: d.pending_revenue.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub patient_name: String,
    pub value: MoneyResponse,
    pub text: String,
    pub share_url: String,
}

impl From<PaymentReceipt> for ReceiptResponse {
    fn from(r: PaymentReceipt) -> Self {
        Self {
            patient_name: r.patient_name,
            value: r.value.into(),
            text: r.text,
            share_url: r.share_url,
        }
    }
}
