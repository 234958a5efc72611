//! Billing service functions with store access.
//!
//! These functions load ledger state through a `LedgerStore`, run the pure
//! planners from `calculators` and hand the resulting settlement back to the
//! store, which applies it in a single transaction.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::calculators::{
    compute_totals, dashboard_snapshot, filter_ledger, month_window, normalize_amount, outstanding_debt,
    patient_account_summary, plan_batch_settlement, plan_single_payment, suggested_payment,
    DashboardSnapshot, FinanceTotals, LedgerTab, OverpaymentPolicy, PatientAccountSummary,
    Settlement,
};
use super::models::{Appointment, LedgerEntry, Patient, PatientLedger};
use super::receipts::{build_receipt, PaymentReceipt};
use super::store::LedgerStore;

/// Billing error types
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Invalid amount '{0}': enter a value greater than zero")]
    InvalidAmount(String),

    #[error("Appointment {0} not found")]
    AppointmentNotFound(Uuid),

    #[error("Patient {0} not found")]
    PatientNotFound(Uuid),

    #[error("Store write failed: {0}")]
    StoreWriteFailure(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a single-appointment payment
#[derive(Debug, Clone)]
pub struct SinglePaymentResult {
    /// Appointment as persisted after the payment
    pub appointment: Appointment,
    pub settlement: Settlement,
}

/// Result of a FIFO batch payment
#[derive(Debug, Clone)]
pub struct BatchPaymentResult {
    pub payment_date: NaiveDate,
    pub settlement: Settlement,
}

/// Finance listing with totals over every appointment
#[derive(Debug, Clone)]
pub struct LedgerView {
    pub entries: Vec<LedgerEntry>,
    pub totals: FinanceTotals,
}

/// Reconciliation engine over a ledger store.
///
/// Every operation takes the calling professional's `user_id`; patients and
/// appointments of other professionals are reported as not found.
#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn LedgerStore>,
    overpayment: OverpaymentPolicy,
    utc_offset: FixedOffset,
}

impl BillingService {
    pub fn new(store: Arc<dyn LedgerStore>, overpayment: OverpaymentPolicy) -> Self {
        Self {
            store,
            overpayment,
            utc_offset: Utc.fix(),
        }
    }

    /// Use the clinic's offset for dashboard day and month boundaries
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    async fn owned_patient(&self, user_id: Uuid, patient_id: Uuid) -> Result<Patient, BillingError> {
        self.store
            .patient(patient_id)
            .await?
            .filter(|p| p.user_id == user_id)
            .ok_or(BillingError::PatientNotFound(patient_id))
    }

    async fn owned_appointment(
        &self,
        user_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<(Appointment, Patient), BillingError> {
        let not_found = || BillingError::AppointmentNotFound(appointment_id);
        let appointment = self.store.appointment(appointment_id).await?.ok_or_else(not_found)?;
        let patient = self
            .store
            .patient(appointment.patient_id)
            .await?
            .filter(|p| p.user_id == user_id)
            .ok_or_else(not_found)?;
        Ok((appointment, patient))
    }

    /// Register a payment against one appointment.
    ///
    /// The amount is rounded to cents and the paid amount is clamped to the
    /// price. Whatever exceeds it is discarded or credited according to the
    /// configured policy.
    pub async fn register_single_payment(
        &self,
        user_id: Uuid,
        appointment_id: Uuid,
        amount: Decimal,
    ) -> Result<SinglePaymentResult, BillingError> {
        let amount = normalize_amount(amount)?;
        let (appointment, _) = self.owned_appointment(user_id, appointment_id).await?;

        let policy = self.overpayment;
        let settlement = self
            .store
            .settle(
                appointment.patient_id,
                Box::new(move |ledger: &PatientLedger| plan_single_payment(ledger, appointment_id, amount, policy)),
            )
            .await?;

        let mut updated = appointment;
        if let Some(allocation) = settlement
            .allocations
            .iter()
            .find(|a| a.appointment_id == appointment_id)
        {
            updated.amount_paid = allocation.amount_paid;
            updated.payment_status = allocation.payment_status;
        }

        if settlement.discarded > Decimal::ZERO {
            warn!(
                appointment_id = %appointment_id,
                discarded = %settlement.discarded,
                "Single payment exceeded the appointment price; excess discarded"
            );
        }

        info!(
            appointment_id = %appointment_id,
            amount = %amount,
            amount_paid = %updated.amount_paid,
            payment_status = updated.payment_status.as_str(),
            "Payment registered"
        );

        Ok(SinglePaymentResult {
            appointment: updated,
            settlement,
        })
    }

    /// Settle a patient payment across open appointments, oldest first.
    ///
    /// `payment_date` is kept for the record only; it does not affect
    /// allocation order.
    pub async fn process_batch_payment(
        &self,
        user_id: Uuid,
        patient_id: Uuid,
        amount: Decimal,
        payment_date: NaiveDate,
    ) -> Result<BatchPaymentResult, BillingError> {
        let amount = normalize_amount(amount)?;

        let settlement = self
            .store
            .settle(
                patient_id,
                Box::new(move |ledger: &PatientLedger| {
                    if ledger.patient.user_id != user_id {
                        return Err(BillingError::PatientNotFound(patient_id));
                    }
                    plan_batch_settlement(ledger, amount)
                }),
            )
            .await?;

        info!(
            patient_id = %patient_id,
            amount = %amount,
            %payment_date,
            settled = settlement.allocations.len(),
            credit_added = %settlement.credit_added,
            "Batch payment processed"
        );

        Ok(BatchPaymentResult {
            payment_date,
            settlement,
        })
    }

    /// Debt over a patient's appointments that are not fully paid
    pub async fn outstanding_debt(&self, user_id: Uuid, patient_id: Uuid) -> Result<Decimal, BillingError> {
        self.owned_patient(user_id, patient_id).await?;
        let appointments = self.store.patient_appointments(patient_id).await?;
        Ok(outstanding_debt(&appointments))
    }

    /// Financial and attendance summary for the patient record page
    pub async fn patient_summary(
        &self,
        user_id: Uuid,
        patient_id: Uuid,
    ) -> Result<PatientAccountSummary, BillingError> {
        let patient = self.owned_patient(user_id, patient_id).await?;
        let appointments = self.store.patient_appointments(patient_id).await?;

        Ok(patient_account_summary(&patient, &appointments))
    }

    /// Finance listing filtered by tab and search; totals cover the professional's whole ledger
    pub async fn ledger_view(
        &self,
        user_id: Uuid,
        tab: LedgerTab,
        search: Option<&str>,
    ) -> Result<LedgerView, BillingError> {
        let entries = self.store.ledger_entries(user_id).await?;
        let totals = compute_totals(entries.iter().map(|e| &e.appointment));
        let entries = filter_ledger(entries, tab, search);

        debug!(count = entries.len(), ?tab, "Ledger view built");

        Ok(LedgerView { entries, totals })
    }

    /// Home dashboard figures for the month containing `now`
    pub async fn dashboard(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<DashboardSnapshot, BillingError> {
        let window = month_window(now, self.utc_offset);
        let appointments = self.store.appointments_between(user_id, window).await?;
        Ok(dashboard_snapshot(&appointments, now, self.utc_offset))
    }

    /// Remaining amount used to prefill the payment form
    pub async fn suggested_payment(&self, user_id: Uuid, appointment_id: Uuid) -> Result<Decimal, BillingError> {
        let (appointment, _) = self.owned_appointment(user_id, appointment_id).await?;
        Ok(suggested_payment(&appointment))
    }

    /// Payment receipt with a WhatsApp share link
    pub async fn receipt(
        &self,
        user_id: Uuid,
        appointment_id: Uuid,
        issued_on: NaiveDate,
    ) -> Result<PaymentReceipt, BillingError> {
        let (appointment, patient) = self.owned_appointment(user_id, appointment_id).await?;

        Ok(build_receipt(
            &appointment,
            &patient.full_name,
            patient.phone.as_deref(),
            issued_on,
        ))
    }
}
