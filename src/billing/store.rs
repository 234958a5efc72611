//! Ledger store seam.
//!
//! `settle` is the only mutation: implementations lock the patient's ledger,
//! run the planner on the snapshot and apply its writes all-or-nothing.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::calculators::{Settlement, TimeWindow};
use super::models::{Appointment, LedgerEntry, Patient, PatientLedger};
use super::queries;
use super::services::BillingError;

/// Pure function from a locked ledger snapshot to the writes to perform
pub type SettlementPlanner = Box<dyn FnOnce(&PatientLedger) -> Result<Settlement, BillingError> + Send>;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, BillingError>;

    async fn patient(&self, id: Uuid) -> Result<Option<Patient>, BillingError>;

    /// All appointments of a patient, ordered by (start_time, id)
    async fn patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, BillingError>;

    /// Finance listing of one professional's patients, newest first
    async fn ledger_entries(&self, user_id: Uuid) -> Result<Vec<LedgerEntry>, BillingError>;

    /// One professional's appointments starting inside `window`
    async fn appointments_between(
        &self,
        user_id: Uuid,
        window: TimeWindow,
    ) -> Result<Vec<Appointment>, BillingError>;

    /// Lock the patient's ledger, plan against it and apply the result atomically
    async fn settle(&self, patient_id: Uuid, planner: SettlementPlanner) -> Result<Settlement, BillingError>;
}

/// Postgres-backed ledger store
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn write_failure(err: sqlx::Error) -> BillingError {
    error!("Ledger write failed: {}", err);
    BillingError::StoreWriteFailure(err.to_string())
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, BillingError> {
        Ok(queries::get_appointment(&self.pool, id).await?)
    }

    async fn patient(&self, id: Uuid) -> Result<Option<Patient>, BillingError> {
        Ok(queries::get_patient(&self.pool, id).await?)
    }

    async fn patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, BillingError> {
        Ok(queries::get_patient_appointments(&self.pool, patient_id).await?)
    }

    async fn ledger_entries(&self, user_id: Uuid) -> Result<Vec<LedgerEntry>, BillingError> {
        Ok(queries::get_ledger_entries(&self.pool, user_id).await?)
    }

    async fn appointments_between(
        &self,
        user_id: Uuid,
        window: TimeWindow,
    ) -> Result<Vec<Appointment>, BillingError> {
        Ok(queries::get_appointments_between(&self.pool, user_id, window.start, window.end).await?)
    }

    async fn settle(&self, patient_id: Uuid, planner: SettlementPlanner) -> Result<Settlement, BillingError> {
        // Dropping `tx` on any early return rolls everything back
        let mut tx = self.pool.begin().await?;

        let patient = queries::lock_patient(&mut tx, patient_id)
            .await?
            .ok_or(BillingError::PatientNotFound(patient_id))?;
        let appointments = queries::lock_patient_appointments(&mut tx, patient_id).await?;

        let ledger = PatientLedger { patient, appointments };
        let mut settlement = planner(&ledger)?;

        for allocation in &settlement.allocations {
            queries::update_appointment_payment(&mut tx, allocation)
                .await
                .map_err(write_failure)?;
        }

        if settlement.credit_added > rust_decimal::Decimal::ZERO {
            settlement.credit_balance = queries::add_patient_credit(&mut tx, patient_id, settlement.credit_added)
                .await
                .map_err(write_failure)?;
        }

        tx.commit().await.map_err(write_failure)?;

        debug!(
            patient_id = %patient_id,
            allocations = settlement.allocations.len(),
            "Settlement committed"
        );

        Ok(settlement)
    }
}
