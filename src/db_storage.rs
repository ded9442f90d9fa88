use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::models::{
    EmailLogEntry, Loan, LoanId, LoanRow, PaymentRecord, PaymentRecordStatus, PaymentTransition,
};
use crate::store::LoanStore;

const LOAN_COLUMNS: &str = "id, name, email, amount, due_date, payment_status, paid_at";

/// PostgreSQL-backed loan store.
///
/// The payment transition is a compare-and-set (`UPDATE ... WHERE
/// payment_status = 'UNPAID'`) inside one transaction with the payment insert.
/// The row lock taken by the update serializes concurrent confirmations: the
/// loser re-evaluates the predicate after the winner commits and matches
/// nothing.
#[derive(Clone)]
pub struct PgLoanStore {
    pool: PgPool,
}

impl PgLoanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStore for PgLoanStore {
    async fn find_unpaid(&self, loan_id: LoanId) -> Result<Option<Loan>, AppError> {
        let row = sqlx::query_as::<_, LoanRow>(&format!(
            "SELECT {} FROM customers WHERE id = $1 AND payment_status = 'UNPAID'",
            LOAN_COLUMNS
        ))
        .bind(loan_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load unpaid loan {}", loan_id))?;

        row.map(Loan::try_from).transpose()
    }

    async fn list_unpaid(&self) -> Result<Vec<Loan>, AppError> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "SELECT {} FROM customers WHERE payment_status = 'UNPAID' \
             ORDER BY due_date ASC NULLS LAST, id ASC",
            LOAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list unpaid loans")?;

        rows.into_iter().map(Loan::try_from).collect()
    }

    async fn mark_paid(&self, loan_id: LoanId) -> Result<Option<PaymentTransition>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start payment transaction")?;

        let updated = sqlx::query_as::<_, LoanRow>(&format!(
            r#"
            UPDATE customers
            SET payment_status = 'PAID',
                paid_at = now()
            WHERE id = $1 AND payment_status = 'UNPAID'
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("Failed to mark loan {} as paid", loan_id))?;

        let Some(row) = updated else {
            tx.rollback()
                .await
                .context("Failed to roll back empty payment transaction")?;
            return Ok(None);
        };

        // Dropping `tx` on any early return below rolls the status flip back.
        let loan = Loan::try_from(row)?;
        let payment_date = loan.paid_at.unwrap_or_else(Utc::now);
        let payment_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO payments (payment_id, customer_id, amount, status, payment_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(payment_id)
        .bind(loan.id)
        .bind(&loan.amount)
        .bind(PaymentRecordStatus::Success.as_str())
        .bind(payment_date)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to record payment for loan {}", loan_id))?;

        tx.commit()
            .await
            .with_context(|| format!("Failed to commit payment for loan {}", loan_id))?;

        tracing::info!("Loan {} marked as PAID (payment {})", loan.id, payment_id);

        let payment = PaymentRecord {
            payment_id,
            loan_id: loan.id,
            amount: loan.amount.clone(),
            status: PaymentRecordStatus::Success,
            payment_date,
        };

        Ok(Some(PaymentTransition { loan, payment }))
    }

    async fn log_email(&self, entry: &EmailLogEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO email_logs (customer_id, sent_at, status)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(entry.loan_id)
        .bind(entry.sent_at)
        .bind(entry.status.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to log email for loan {}", entry.loan_id))?;

        Ok(())
    }
}
