use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

/// Loan reference. The primary key doubles as the payment-link token.
pub type LoanId = i64;

// ============ Loan ============

/// Payment state of a loan. `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Paid => "PAID",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(PaymentStatus::Unpaid),
            "PAID" => Ok(PaymentStatus::Paid),
            other => Err(AppError::StoreError(format!(
                "Unknown payment status '{}'",
                other
            ))),
        }
    }
}

/// A customer's loan as held in the `customers` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    /// Display name of the customer.
    pub name: String,
    /// Contact address for reminders and receipts.
    pub email: String,
    /// Amount due. Never negative.
    pub amount: BigDecimal,
    pub due_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
    /// Set only on the UNPAID → PAID transition.
    pub paid_at: Option<DateTime<Utc>>,
}

/// Raw `customers` row; the status column is plain text in the schema.
#[derive(Debug, Clone, FromRow)]
pub struct LoanRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub amount: BigDecimal,
    pub due_date: Option<NaiveDate>,
    pub payment_status: String,
    pub paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<LoanRow> for Loan {
    type Error = AppError;

    fn try_from(row: LoanRow) -> Result<Self, Self::Error> {
        Ok(Loan {
            id: row.id,
            name: row.name,
            email: row.email,
            amount: row.amount,
            due_date: row.due_date,
            payment_status: row.payment_status.parse()?,
            paid_at: row.paid_at,
        })
    }
}

// ============ Payment ============

/// Outcome stored on a payment row. Payments are self-attested, so the only
/// recorded outcome is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentRecordStatus {
    Success,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Success => "SUCCESS",
        }
    }
}

/// Append-only evidence of a completed UNPAID → PAID transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: Uuid,
    pub loan_id: LoanId,
    /// Copied from the loan at confirmation time, never from the request.
    pub amount: BigDecimal,
    pub status: PaymentRecordStatus,
    pub payment_date: DateTime<Utc>,
}

/// Result of a successful compare-and-set: the loan as it now stands plus the
/// payment row written in the same unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentTransition {
    pub loan: Loan,
    pub payment: PaymentRecord,
}

// ============ Email log ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    Sent,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "SENT",
        }
    }
}

/// Audit entry for a reminder the mail relay accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailLogEntry {
    pub loan_id: LoanId,
    pub sent_at: DateTime<Utc>,
    pub status: DeliveryStatus,
}

impl EmailLogEntry {
    pub fn sent(loan_id: LoanId, sent_at: DateTime<Utc>) -> Self {
        Self {
            loan_id,
            sent_at,
            status: DeliveryStatus::Sent,
        }
    }
}

// ============ Display helpers ============

/// Formats an amount with two decimals behind the configured currency symbol.
pub fn format_amount(currency_symbol: &str, amount: &BigDecimal) -> String {
    format!("{}{}", currency_symbol, amount.with_scale(2))
}

/// Long date form used in emails and pages, e.g. `05 March, 2026`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d %B, %Y").to_string()
}
