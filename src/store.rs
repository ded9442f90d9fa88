use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{EmailLogEntry, Loan, LoanId, PaymentTransition};

/// Access to the loan table and its two append-only logs.
///
/// "Nothing matched" is an `Ok(None)`, never an error: callers branch on it
/// for the expired and already-processed views.
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Point read of a loan that is still UNPAID.
    async fn find_unpaid(&self, loan_id: LoanId) -> Result<Option<Loan>, AppError>;

    /// Every UNPAID loan, earliest due date first, loans without a due date last.
    async fn list_unpaid(&self) -> Result<Vec<Loan>, AppError>;

    /// Atomically flips an UNPAID loan to PAID and appends its payment row.
    ///
    /// Returns `None` when the loan is unknown or no longer UNPAID. Either both
    /// writes are visible afterwards or neither is.
    async fn mark_paid(&self, loan_id: LoanId) -> Result<Option<PaymentTransition>, AppError>;

    async fn log_email(&self, entry: &EmailLogEntry) -> Result<(), AppError>;
}

pub type LoanStoreRef = Arc<dyn LoanStore>;
