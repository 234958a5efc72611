//! Billing reconciliation engine.
//!
//! Registers single-appointment payments, settles patient payments across
//! open appointments oldest first (overflow goes to the patient's credit
//! balance) and aggregates the finance views built on the same ledger.

pub mod calculators;
pub mod memory;
pub mod models;
pub mod queries;
pub mod receipts;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod store;

// Re-export commonly used items
pub use calculators::{
    derive_payment_status, parse_amount, round_money, OverpaymentPolicy, Settlement,
    SETTLEMENT_TOLERANCE,
};
pub use memory::MemoryLedgerStore;
pub use models::{Appointment, Patient, PaymentStatus, VisitStatus};
pub use receipts::format_brl;
pub use routes::router;
pub use services::{BatchPaymentResult, BillingError, BillingService, SinglePaymentResult};
pub use store::{LedgerStore, PgLedgerStore};
