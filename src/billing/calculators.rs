//! Core ledger calculation functions.
//!
//! Pure functions for settlement math - no database access.
//! Planners take a locked `PatientLedger` snapshot and return a `Settlement`
//! describing the writes; the store applies that description atomically.

use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{Appointment, LedgerEntry, Patient, PatientLedger, PaymentStatus, VisitStatus};
use super::services::BillingError;

/// Absorbs rounding on the "fully paid" comparison of batch settlement (0.01)
pub const SETTLEMENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use mentepsi_ledger::billing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Derive the payment label from what was paid against what is owed.
///
/// `tolerance` widens the "paid" band downwards: batch settlement passes
/// `SETTLEMENT_TOLERANCE`, single payments pass zero. Checked in order, so a
/// zero-price appointment is always `Paid`.
pub fn derive_payment_status(amount_paid: Decimal, price: Decimal, tolerance: Decimal) -> PaymentStatus {
    if amount_paid >= price - tolerance {
        PaymentStatus::Paid
    } else if amount_paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    }
}

/// Parse a user-typed amount. Accepts `,` as the decimal separator.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use mentepsi_ledger::billing::parse_amount;
///
/// assert_eq!(parse_amount("12,50").unwrap(), dec!(12.50));
/// assert!(parse_amount("abc").is_err());
/// assert!(parse_amount("0").is_err());
/// assert!(parse_amount("0,001").is_err());
/// ```
///
/// The parsed value is rounded to cents before the positivity check, so what
/// is returned is exactly what a `NUMERIC(12,2)` column stores.
pub fn parse_amount(raw: &str) -> Result<Decimal, BillingError> {
    let normalized = raw.trim().replace(',', ".");
    let amount = normalized
        .parse::<Decimal>()
        .map_err(|_| BillingError::InvalidAmount(raw.trim().to_string()))?;
    normalize_amount(amount)
}

/// Round a payment to cents and require it to stay above zero
pub fn normalize_amount(amount: Decimal) -> Result<Decimal, BillingError> {
    let cents = round_money(amount, 2);
    if cents <= Decimal::ZERO {
        return Err(BillingError::InvalidAmount(amount.to_string()));
    }
    Ok(cents)
}

fn ensure_positive(amount: Decimal) -> Result<(), BillingError> {
    if amount <= Decimal::ZERO {
        return Err(BillingError::InvalidAmount(amount.to_string()));
    }
    Ok(())
}

/// What happens to the part of a single-appointment payment above the price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverpaymentPolicy {
    /// Clamp to the price and drop the excess
    #[default]
    Discard,
    /// Clamp to the price and move the excess to the patient's credit balance
    Credit,
}

impl FromStr for OverpaymentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discard" => Ok(OverpaymentPolicy::Discard),
            "credit" => Ok(OverpaymentPolicy::Credit),
            other => Err(format!("expected 'discard' or 'credit', got '{}'", other)),
        }
    }
}

/// Write to perform on one appointment
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub appointment_id: Uuid,
    /// Portion of the payment applied to this appointment
    pub applied: Decimal,
    /// New `amount_paid`
    pub amount_paid: Decimal,
    /// New `payment_status`
    pub payment_status: PaymentStatus,
}

/// Full description of one reconciliation, applied by the store in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub patient_id: Uuid,
    pub amount: Decimal,
    pub allocations: Vec<Allocation>,
    /// Added to `patients.credit_balance`
    pub credit_added: Decimal,
    /// Excess dropped under `OverpaymentPolicy::Discard`
    pub discarded: Decimal,
    /// Patient credit balance once the settlement is applied
    pub credit_balance: Decimal,
}

impl Settlement {
    fn new(patient: &Patient, amount: Decimal) -> Self {
        Self {
            patient_id: patient.id,
            amount,
            allocations: Vec::new(),
            credit_added: Decimal::ZERO,
            discarded: Decimal::ZERO,
            credit_balance: patient.credit_balance,
        }
    }

    /// Sum of the amounts applied to appointments
    pub fn total_applied(&self) -> Decimal {
        self.allocations.iter().map(|a| a.applied).sum()
    }

    fn credit(&mut self, amount: Decimal) {
        self.credit_added += amount;
        self.credit_balance += amount;
    }
}

/// Plan a payment against one appointment.
///
/// The new paid amount is clamped to the price; the excess is handled by
/// `policy`.
pub fn plan_single_payment(
    ledger: &PatientLedger,
    appointment_id: Uuid,
    amount: Decimal,
    policy: OverpaymentPolicy,
) -> Result<Settlement, BillingError> {
    ensure_positive(amount)?;

    let appointment = ledger
        .appointments
        .iter()
        .find(|a| a.id == appointment_id)
        .ok_or(BillingError::AppointmentNotFound(appointment_id))?;

    let new_paid = (appointment.amount_paid + amount).min(appointment.price);
    let applied = new_paid - appointment.amount_paid;
    let excess = amount - applied;

    let mut settlement = Settlement::new(&ledger.patient, amount);
    settlement.allocations.push(Allocation {
        appointment_id,
        applied,
        amount_paid: new_paid,
        payment_status: derive_payment_status(new_paid, appointment.price, Decimal::ZERO),
    });

    if excess > Decimal::ZERO {
        match policy {
            OverpaymentPolicy::Discard => settlement.discarded = excess,
            OverpaymentPolicy::Credit => settlement.credit(excess),
        }
    }

    Ok(settlement)
}

/// Plan a FIFO settlement of a patient payment.
///
/// Open appointments are paid oldest first (ties broken by id); whatever is
/// left once every debt is covered goes to the credit balance, so
/// `total_applied() + credit_added == amount` always holds.
pub fn plan_batch_settlement(ledger: &PatientLedger, amount: Decimal) -> Result<Settlement, BillingError> {
    ensure_positive(amount)?;

    let mut open: Vec<&Appointment> = ledger
        .appointments
        .iter()
        .filter(|a| a.payment_status.is_open())
        .collect();
    open.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));

    let mut settlement = Settlement::new(&ledger.patient, amount);
    let mut remaining = amount;

    for appointment in open {
        if remaining <= Decimal::ZERO {
            break;
        }

        let debt = appointment.price - appointment.amount_paid;
        if debt <= Decimal::ZERO {
            continue;
        }

        let pay_now = remaining.min(debt);
        let new_paid = (appointment.amount_paid + pay_now).min(appointment.price);

        settlement.allocations.push(Allocation {
            appointment_id: appointment.id,
            applied: pay_now,
            amount_paid: new_paid,
            payment_status: derive_payment_status(new_paid, appointment.price, SETTLEMENT_TOLERANCE),
        });

        remaining -= pay_now;
    }

    if remaining > Decimal::ZERO {
        settlement.credit(remaining);
    }

    Ok(settlement)
}

/// Aggregate finance totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FinanceTotals {
    pub paid: Decimal,
    pub pending: Decimal,
    pub total: Decimal,
}

/// Sum prices and payments over the given appointments.
///
/// `pending` is `Σ price − Σ amount_paid`; callers filter (e.g. cancelled
/// visits) before calling.
pub fn compute_totals<'a, I>(appointments: I) -> FinanceTotals
where
    I: IntoIterator<Item = &'a Appointment>,
{
    let (total, paid) = appointments
        .into_iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(total, paid), a| {
            (total + a.price, paid + a.amount_paid)
        });

    FinanceTotals {
        paid,
        pending: total - paid,
        total,
    }
}

/// Outstanding debt over appointments that are not fully paid
pub fn outstanding_debt<'a, I>(appointments: I) -> Decimal
where
    I: IntoIterator<Item = &'a Appointment>,
{
    appointments
        .into_iter()
        .filter(|a| a.payment_status.is_open())
        .map(|a| a.price - a.amount_paid)
        .sum()
}

/// Remaining amount for an appointment, used to prefill the payment form
pub fn suggested_payment(appointment: &Appointment) -> Decimal {
    round_money(appointment.debt(), 2)
}

/// Financial and attendance figures for one patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientAccountSummary {
    pub debt: Decimal,
    pub paid: Decimal,
    pub credit: Decimal,
    pub done: usize,
    pub scheduled: usize,
    pub cancelled: usize,
}

pub fn patient_account_summary(patient: &Patient, appointments: &[Appointment]) -> PatientAccountSummary {
    let count = |status: VisitStatus| appointments.iter().filter(|a| a.status == status).count();

    PatientAccountSummary {
        debt: outstanding_debt(appointments),
        paid: appointments.iter().map(|a| a.amount_paid).sum(),
        credit: patient.credit_balance,
        done: count(VisitStatus::Confirmed),
        scheduled: count(VisitStatus::Scheduled),
        cancelled: count(VisitStatus::Cancelled),
    }
}

/// Half-open window `[start, end)` of UTC instants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Local midnight of `date` at `offset`, as a UTC instant
fn midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    (date.and_time(NaiveTime::MIN) - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// The local day containing `now`
pub fn day_window(now: DateTime<Utc>, offset: FixedOffset) -> TimeWindow {
    let today = now.with_timezone(&offset).date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX);
    TimeWindow {
        start: midnight(today, offset),
        end: midnight(tomorrow, offset),
    }
}

/// The local calendar month containing `now`
pub fn month_window(now: DateTime<Utc>, offset: FixedOffset) -> TimeWindow {
    let today = now.with_timezone(&offset).date_naive();
    let first = today - Days::new(u64::from(today.day0()));
    let next = first.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);
    TimeWindow {
        start: midnight(first, offset),
        end: midnight(next, offset),
    }
}

/// Home dashboard figures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub sessions_today: usize,
    pub monthly_revenue: Decimal,
    pub pending_revenue: Decimal,
}

/// Compute the dashboard from appointments of the current month.
///
/// Day and month boundaries follow the clinic's `offset`. Revenue counts
/// every payment received (partials included); pending revenue only counts
/// confirmed visits.
pub fn dashboard_snapshot(appointments: &[Appointment], now: DateTime<Utc>, offset: FixedOffset) -> DashboardSnapshot {
    let today = day_window(now, offset);
    let month = month_window(now, offset);

    let sessions_today = appointments
        .iter()
        .filter(|a| today.contains(a.start_time) && a.status != VisitStatus::Cancelled)
        .count();

    let in_month = || appointments.iter().filter(move |a| month.contains(a.start_time));

    let monthly_revenue = in_month()
        .filter(|a| a.amount_paid > Decimal::ZERO)
        .map(|a| a.amount_paid)
        .sum();

    let pending_revenue = in_month()
        .filter(|a| a.status == VisitStatus::Confirmed)
        .map(|a| a.price - a.amount_paid)
        .sum();

    DashboardSnapshot {
        sessions_today,
        monthly_revenue,
        pending_revenue,
    }
}

/// Finance listing tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerTab {
    #[default]
    All,
    #[serde(alias = "pendentes")]
    Pending,
    #[serde(alias = "pagos")]
    Paid,
}

/// Filter the finance listing by tab and a case-insensitive patient-name search
pub fn filter_ledger(entries: Vec<LedgerEntry>, tab: LedgerTab, search: Option<&str>) -> Vec<LedgerEntry> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    entries
        .into_iter()
        .filter(|e| match tab {
            LedgerTab::All => true,
            LedgerTab::Pending => e.appointment.payment_status.is_open(),
            LedgerTab::Paid => e.appointment.payment_status == PaymentStatus::Paid,
        })
        .filter(|e| match &needle {
            Some(needle) => e.patient_name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .collect()
}
