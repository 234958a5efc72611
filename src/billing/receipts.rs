//! Payment receipts shared over WhatsApp.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use url::form_urlencoded;

use super::calculators::round_money;
use super::models::Appointment;

/// Receipt ready to be shown or shared
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub patient_name: String,
    pub value: Decimal,
    pub text: String,
    pub share_url: String,
}

/// Format an amount as Brazilian reais, e.g. `R$ 1.234,56`
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use mentepsi_ledger::billing::format_brl;
///
/// assert_eq!(format_brl(dec!(1234.5)), "R$ 1.234,50");
/// assert_eq!(format_brl(dec!(0)), "R$ 0,00");
/// ```
pub fn format_brl(amount: Decimal) -> String {
    let rounded = round_money(amount, 2);
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}R$ {},{}", sign, grouped, frac_part)
}

/// Receipt value: what was paid, or the full price when nothing was paid yet
pub fn receipt_value(appointment: &Appointment) -> Decimal {
    if appointment.amount_paid > Decimal::ZERO {
        appointment.amount_paid
    } else {
        appointment.price
    }
}

pub fn receipt_text(patient_name: &str, value: Decimal, issued_on: NaiveDate) -> String {
    format!(
        "RECIBO DE PAGAMENTO - MentePsi\n\nRecebemos de {} a quantia de {}.\nReferente a: Serviços de Psicoterapia.\nData: {}.",
        patient_name,
        format_brl(value),
        issued_on.format("%d/%m/%Y")
    )
}

/// `wa.me` link addressed to the patient's Brazilian number when one is on file
pub fn whatsapp_link(phone: Option<&str>, text: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(text.as_bytes()).collect();
    let digits: String = phone
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        format!("https://wa.me/?text={}", encoded)
    } else {
        format!("https://wa.me/55{}?text={}", digits, encoded)
    }
}

pub fn build_receipt(
    appointment: &Appointment,
    patient_name: &str,
    phone: Option<&str>,
    issued_on: NaiveDate,
) -> PaymentReceipt {
    let value = receipt_value(appointment);
    let text = receipt_text(patient_name, value, issued_on);
    let share_url = whatsapp_link(phone, &text);

    PaymentReceipt {
        patient_name: patient_name.to_string(),
        value,
        text,
        share_url,
    }
}
