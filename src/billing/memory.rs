//! In-memory ledger store for tests and local runs without Postgres.
//!
//! A single async mutex serializes settlements, and each settlement is applied
//! to a copy that only replaces the live state once every write succeeded.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::calculators::{Settlement, TimeWindow};
use super::models::{Appointment, LedgerEntry, Patient, PatientLedger};
use super::services::BillingError;
use super::store::{LedgerStore, SettlementPlanner};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    patients: HashMap<Uuid, Patient>,
    appointments: HashMap<Uuid, Appointment>,
}

impl LedgerState {
    fn owned_by(&self, appointment: &Appointment, user_id: Uuid) -> bool {
        self.patients
            .get(&appointment.patient_id)
            .is_some_and(|p| p.user_id == user_id)
    }

    fn patient_appointments(&self, patient_id: Uuid) -> Vec<Appointment> {
        let mut appointments: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        appointments.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        appointments
    }
}

/// Ledger store backed by hash maps
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Mutex<LedgerState>,
    failing_writes: Mutex<HashSet<Uuid>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_patient(&self, patient: Patient) {
        self.state.lock().await.patients.insert(patient.id, patient);
    }

    pub async fn insert_appointment(&self, appointment: Appointment) {
        self.state
            .lock()
            .await
            .appointments
            .insert(appointment.id, appointment);
    }

    /// Make every later write to this appointment (or patient) fail
    pub async fn fail_writes_for(&self, id: Uuid) {
        self.failing_writes.lock().await.insert(id);
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, BillingError> {
        Ok(self.state.lock().await.appointments.get(&id).cloned())
    }

    async fn patient(&self, id: Uuid) -> Result<Option<Patient>, BillingError> {
        Ok(self.state.lock().await.patients.get(&id).cloned())
    }

    async fn patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, BillingError> {
        Ok(self.state.lock().await.patient_appointments(patient_id))
    }

    async fn ledger_entries(&self, user_id: Uuid) -> Result<Vec<LedgerEntry>, BillingError> {
        let state = self.state.lock().await;
        let mut entries: Vec<LedgerEntry> = state
            .appointments
            .values()
            .filter_map(|a| {
                let p = state.patients.get(&a.patient_id)?;
                (p.user_id == user_id).then(|| LedgerEntry {
                    appointment: a.clone(),
                    patient_name: p.full_name.clone(),
                    patient_phone: p.phone.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.appointment
                .start_time
                .cmp(&a.appointment.start_time)
                .then_with(|| b.appointment.id.cmp(&a.appointment.id))
        });
        Ok(entries)
    }

    async fn appointments_between(
        &self,
        user_id: Uuid,
        window: TimeWindow,
    ) -> Result<Vec<Appointment>, BillingError> {
        let state = self.state.lock().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| window.contains(a.start_time) && state.owned_by(a, user_id))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.start_time);
        Ok(appointments)
    }

    async fn settle(&self, patient_id: Uuid, planner: SettlementPlanner) -> Result<Settlement, BillingError> {
        let mut state = self.state.lock().await;
        let failing = self.failing_writes.lock().await;

        let patient = state
            .patients
            .get(&patient_id)
            .cloned()
            .ok_or(BillingError::PatientNotFound(patient_id))?;
        let ledger = PatientLedger {
            appointments: state.patient_appointments(patient_id),
            patient,
        };
        let settlement = planner(&ledger)?;

        let mut staged = state.clone();
        for allocation in &settlement.allocations {
            if failing.contains(&allocation.appointment_id) {
                return Err(BillingError::StoreWriteFailure(format!(
                    "write to appointment {} rejected",
                    allocation.appointment_id
                )));
            }
            let appointment = staged
                .appointments
                .get_mut(&allocation.appointment_id)
                .ok_or(BillingError::AppointmentNotFound(allocation.appointment_id))?;
            appointment.amount_paid = allocation.amount_paid;
            appointment.payment_status = allocation.payment_status;
        }

        if settlement.credit_added > Decimal::ZERO {
            if failing.contains(&patient_id) {
                return Err(BillingError::StoreWriteFailure(format!(
                    "write to patient {} rejected",
                    patient_id
                )));
            }
            if let Some(patient) = staged.patients.get_mut(&patient_id) {
                patient.credit_balance += settlement.credit_added;
            }
        }

        *state = staged;
        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::calculators::plan_batch_settlement;
    use crate::billing::models::{PaymentStatus, VisitStatus};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn seed_patient() -> Patient {
        Patient {
            id: Uuid::from_u128(1),
            user_id: Uuid::from_u128(50),
            full_name: "Carla Dias".to_string(),
            phone: None,
            credit_balance: dec!(0),
        }
    }

    fn seed_appointment(n: u128, day: u32) -> Appointment {
        Appointment {
            id: Uuid::from_u128(n),
            patient_id: Uuid::from_u128(1),
            start_time: Utc.with_ymd_and_hms(2025, 5, day, 10, 0, 0).unwrap(),
            price: dec!(100),
            amount_paid: dec!(0),
            payment_status: PaymentStatus::Pending,
            status: VisitStatus::Confirmed,
        }
    }

    #[tokio::test]
    async fn test_settle_applies_all_writes() {
        let store = MemoryLedgerStore::new();
        store.insert_patient(seed_patient()).await;
        store.insert_appointment(seed_appointment(10, 1)).await;
        store.insert_appointment(seed_appointment(11, 2)).await;

        let settlement = store
            .settle(
                Uuid::from_u128(1),
                Box::new(|ledger: &PatientLedger| plan_batch_settlement(ledger, dec!(250))),
            )
            .await
            .unwrap();

        assert_eq!(settlement.credit_added, dec!(50));
        let patient = store.patient(Uuid::from_u128(1)).await.unwrap().unwrap();
        assert_eq!(patient.credit_balance, dec!(50));
        let apts = store.patient_appointments(Uuid::from_u128(1)).await.unwrap();
        assert!(apts.iter().all(|a| a.payment_status == PaymentStatus::Paid));
    }

    #[tokio::test]
    async fn test_settle_failure_leaves_state_untouched() {
        let store = MemoryLedgerStore::new();
        store.insert_patient(seed_patient()).await;
        store.insert_appointment(seed_appointment(10, 1)).await;
        store.insert_appointment(seed_appointment(11, 2)).await;
        store.fail_writes_for(Uuid::from_u128(11)).await;

        let err = store
            .settle(
                Uuid::from_u128(1),
                Box::new(|ledger: &PatientLedger| plan_batch_settlement(ledger, dec!(150))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::StoreWriteFailure(_)));

        // First appointment was planned before the failing one but must not be applied
        let first = store.appointment(Uuid::from_u128(10)).await.unwrap().unwrap();
        assert_eq!(first.amount_paid, dec!(0));
        assert_eq!(first.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_reads_are_scoped_to_professional() {
        let store = MemoryLedgerStore::new();
        store.insert_patient(seed_patient()).await;
        store
            .insert_patient(Patient {
                id: Uuid::from_u128(2),
                user_id: Uuid::from_u128(60),
                full_name: "Bruno Lima".to_string(),
                ..seed_patient()
            })
            .await;
        store.insert_appointment(seed_appointment(10, 1)).await;
        store
            .insert_appointment(Appointment {
                patient_id: Uuid::from_u128(2),
                ..seed_appointment(20, 2)
            })
            .await;

        let entries = store.ledger_entries(Uuid::from_u128(50)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].patient_name, "Carla Dias");

        let window = TimeWindow {
            start: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        };
        let apts = store.appointments_between(Uuid::from_u128(60), window).await.unwrap();
        assert_eq!(apts.len(), 1);
        assert_eq!(apts[0].id, Uuid::from_u128(20));

        assert!(store.ledger_entries(Uuid::from_u128(70)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settle_unknown_patient() {
        let store = MemoryLedgerStore::new();
        let err = store
            .settle(
                Uuid::from_u128(2),
                Box::new(|ledger: &PatientLedger| plan_batch_settlement(ledger, dec!(10))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::PatientNotFound(_)));
    }
}
