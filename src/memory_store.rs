use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    EmailLogEntry, Loan, LoanId, PaymentRecord, PaymentRecordStatus, PaymentStatus,
    PaymentTransition,
};
use crate::store::LoanStore;

#[derive(Debug, Default, Clone)]
struct Tables {
    loans: BTreeMap<LoanId, Loan>,
    payments: Vec<PaymentRecord>,
    email_logs: Vec<EmailLogEntry>,
}

/// A thread-safe in-memory loan store.
///
/// All tables sit behind one mutex, so `mark_paid` checks and applies its two
/// writes as a single step. Backs the test suite, with switches that inject
/// store faults.
#[derive(Default, Clone)]
pub struct InMemoryLoanStore {
    tables: Arc<Mutex<Tables>>,
    fail_payment_insert: Arc<AtomicBool>,
    fail_email_log: Arc<AtomicBool>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loans(loans: impl IntoIterator<Item = Loan>) -> Self {
        let tables = Tables {
            loans: loans.into_iter().map(|loan| (loan.id, loan)).collect(),
            ..Tables::default()
        };
        Self {
            tables: Arc::new(Mutex::new(tables)),
            ..Self::default()
        }
    }

    pub async fn get_loan(&self, loan_id: LoanId) -> Option<Loan> {
        self.tables.lock().await.loans.get(&loan_id).cloned()
    }

    pub async fn payments_for(&self, loan_id: LoanId) -> Vec<PaymentRecord> {
        self.tables
            .lock()
            .await
            .payments
            .iter()
            .filter(|p| p.loan_id == loan_id)
            .cloned()
            .collect()
    }

    pub async fn email_logs(&self) -> Vec<EmailLogEntry> {
        self.tables.lock().await.email_logs.clone()
    }

    /// Makes every following payment insert fail after the status flip has
    /// been staged, exercising the rollback path.
    pub fn fail_payment_inserts(&self, fail: bool) {
        self.fail_payment_insert.store(fail, Ordering::SeqCst);
    }

    pub fn fail_email_logs(&self, fail: bool) {
        self.fail_email_log.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LoanStore for InMemoryLoanStore {
    async fn find_unpaid(&self, loan_id: LoanId) -> Result<Option<Loan>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .loans
            .get(&loan_id)
            .filter(|loan| loan.payment_status == PaymentStatus::Unpaid)
            .cloned())
    }

    async fn list_unpaid(&self) -> Result<Vec<Loan>, AppError> {
        let tables = self.tables.lock().await;
        let mut unpaid: Vec<Loan> = tables
            .loans
            .values()
            .filter(|loan| loan.payment_status == PaymentStatus::Unpaid)
            .cloned()
            .collect();
        // None sorts after every date, matching ORDER BY due_date ASC NULLS LAST
        unpaid.sort_by_key(|loan| (loan.due_date.is_none(), loan.due_date, loan.id));
        Ok(unpaid)
    }

    async fn mark_paid(&self, loan_id: LoanId) -> Result<Option<PaymentTransition>, AppError> {
        let mut tables = self.tables.lock().await;

        let Some(current) = tables.loans.get(&loan_id) else {
            return Ok(None);
        };
        if current.payment_status != PaymentStatus::Unpaid {
            return Ok(None);
        }

        // Stage both writes, publish only if both succeed.
        let now = Utc::now();
        let mut loan = current.clone();
        loan.payment_status = PaymentStatus::Paid;
        loan.paid_at = Some(now);

        if self.fail_payment_insert.load(Ordering::SeqCst) {
            return Err(AppError::StoreError(format!(
                "simulated failure inserting payment for loan {}",
                loan_id
            )));
        }

        let payment = PaymentRecord {
            payment_id: Uuid::new_v4(),
            loan_id,
            amount: loan.amount.clone(),
            status: PaymentRecordStatus::Success,
            payment_date: now,
        };

        tables.loans.insert(loan_id, loan.clone());
        tables.payments.push(payment.clone());

        Ok(Some(PaymentTransition { loan, payment }))
    }

    async fn log_email(&self, entry: &EmailLogEntry) -> Result<(), AppError> {
        if self.fail_email_log.load(Ordering::SeqCst) {
            return Err(AppError::StoreError(format!(
                "simulated failure logging email for loan {}",
                entry.loan_id
            )));
        }
        self.tables.lock().await.email_logs.push(entry.clone());
        Ok(())
    }
}
