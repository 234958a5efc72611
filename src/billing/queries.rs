//! Database queries for the billing ledger.
//!
//! Locking reads (`FOR UPDATE`) take a connection so they can run inside the
//! settlement transaction; plain reads take the pool.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::calculators::Allocation;
use super::models::{Appointment, LedgerEntry, Patient};

/// Get an appointment by id
pub async fn get_appointment(pool: &PgPool, id: Uuid) -> Result<Option<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        r#"
        SELECT id, patient_id, start_time, price, amount_paid, payment_status, status
        FROM appointments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Get a patient by id
pub async fn get_patient(pool: &PgPool, id: Uuid) -> Result<Option<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        r#"
        SELECT id, user_id, full_name, phone, credit_balance
        FROM patients
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// All appointments of a patient, oldest first
pub async fn get_patient_appointments(pool: &PgPool, patient_id: Uuid) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        r#"
        SELECT id, patient_id, start_time, price, amount_paid, payment_status, status
        FROM appointments
        WHERE patient_id = $1
        ORDER BY start_time ASC, id ASC
        "#,
    )
    .bind(patient_id)
    .fetch_all(pool)
    .await
}

/// Finance listing: the professional's appointments with patient contact fields, newest first
pub async fn get_ledger_entries(pool: &PgPool, user_id: Uuid) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        r#"
        SELECT
            a.id, a.patient_id, a.start_time, a.price, a.amount_paid,
            a.payment_status, a.status,
            p.full_name AS patient_name,
            p.phone AS patient_phone
        FROM appointments a
        JOIN patients p ON p.id = a.patient_id
        WHERE p.user_id = $1
        ORDER BY a.start_time DESC, a.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// The professional's appointments starting in `[start, end)`
pub async fn get_appointments_between(
    pool: &PgPool,
    user_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        r#"
        SELECT
            a.id, a.patient_id, a.start_time, a.price, a.amount_paid,
            a.payment_status, a.status
        FROM appointments a
        JOIN patients p ON p.id = a.patient_id
        WHERE p.user_id = $1
          AND a.start_time >= $2
          AND a.start_time < $3
        ORDER BY a.start_time ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Lock the patient row for the rest of the transaction
pub async fn lock_patient(conn: &mut PgConnection, id: Uuid) -> Result<Option<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        r#"
        SELECT id, user_id, full_name, phone, credit_balance
        FROM patients
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Lock every appointment of the patient for the rest of the transaction
pub async fn lock_patient_appointments(
    conn: &mut PgConnection,
    patient_id: Uuid,
) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        r#"
        SELECT id, patient_id, start_time, price, amount_paid, payment_status, status
        FROM appointments
        WHERE patient_id = $1
        ORDER BY start_time ASC, id ASC
        FOR UPDATE
        "#,
    )
    .bind(patient_id)
    .fetch_all(conn)
    .await
}

/// Persist the new paid amount and status of one appointment
pub async fn update_appointment_payment(conn: &mut PgConnection, allocation: &Allocation) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET amount_paid = $2,
            payment_status = $3
        WHERE id = $1
        "#,
    )
    .bind(allocation.appointment_id)
    .bind(allocation.amount_paid)
    .bind(allocation.payment_status.as_str())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

/// Atomically add to a patient's credit balance
pub async fn add_patient_credit(conn: &mut PgConnection, patient_id: Uuid, amount: Decimal) -> Result<Decimal, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        UPDATE patients
        SET credit_balance = credit_balance + $2
        WHERE id = $1
        RETURNING credit_balance
        "#,
    )
    .bind(patient_id)
    .bind(amount)
    .fetch_one(conn)
    .await
}
