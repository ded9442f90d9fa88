use bigdecimal::BigDecimal;
use chrono::{DateTime, Local, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::mailer::{Delivery, EmailMessage, MailerRef};
use crate::models::{format_amount, format_date, LoanId, PaymentTransition};
use crate::store::LoanStoreRef;
use crate::templates::{self, Templates};

/// What `GET /pay/{loan}` shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentPage {
    Due(PaymentDue),
    /// Already paid, or no such loan. A normal outcome, not a fault.
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDue {
    pub loan_id: LoanId,
    pub name: String,
    pub amount: BigDecimal,
}

/// What `POST /pay/confirm/{loan}` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Paid(PaymentReceipt),
    /// Nothing was UNPAID any more: a replayed or concurrent confirmation.
    AlreadyProcessed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub loan_id: LoanId,
    pub payment_id: Uuid,
    pub name: String,
    pub email: String,
    pub amount: BigDecimal,
    pub paid_at: DateTime<Utc>,
    /// Whether the mail relay accepted the confirmation email. False when it
    /// failed or was only logged.
    pub confirmation_sent: bool,
}

/// Loan references arrive as raw path segments. Anything that is not a key
/// cannot name an unpaid loan.
pub fn parse_loan_ref(raw: &str) -> Option<LoanId> {
    raw.trim().parse::<LoanId>().ok()
}

/// The payment transition handler: shows the amount due and moves a loan from
/// UNPAID to PAID exactly once.
#[derive(Clone)]
pub struct PaymentService {
    store: LoanStoreRef,
    mailer: MailerRef,
    templates: Arc<Templates>,
    sender_name: String,
    currency_symbol: String,
}

impl PaymentService {
    pub fn new(
        store: LoanStoreRef,
        mailer: MailerRef,
        templates: Arc<Templates>,
        sender_name: String,
        currency_symbol: String,
    ) -> Self {
        Self {
            store,
            mailer,
            templates,
            sender_name,
            currency_symbol,
        }
    }

    pub async fn show_payment_page(&self, loan_id: LoanId) -> Result<PaymentPage, AppError> {
        let page = match self.store.find_unpaid(loan_id).await? {
            Some(loan) => PaymentPage::Due(PaymentDue {
                loan_id: loan.id,
                name: loan.name,
                amount: loan.amount,
            }),
            None => {
                tracing::debug!("No unpaid loan {}, showing expired page", loan_id);
                PaymentPage::Expired
            }
        };
        Ok(page)
    }

    /// Confirms payment for a loan.
    ///
    /// The status flip and the payment row commit together or not at all; the
    /// amount comes from the stored loan. The confirmation email is sent only
    /// after the commit and its failure never undoes the payment.
    pub async fn confirm_payment(&self, loan_id: LoanId) -> Result<ConfirmOutcome, AppError> {
        let transition = self
            .store
            .mark_paid(loan_id)
            .await
            .with_context(|| format!("Payment transition failed for loan {}", loan_id))?;

        let Some(transition) = transition else {
            tracing::info!("Loan {} already processed, confirmation ignored", loan_id);
            return Ok(ConfirmOutcome::AlreadyProcessed);
        };

        tracing::info!(
            "Payment accepted for loan {}: {}",
            loan_id,
            format_amount(&self.currency_symbol, &transition.payment.amount)
        );

        let confirmation_sent = match self.send_confirmation(&transition).await {
            Ok(Delivery::Accepted) => {
                tracing::info!(
                    "✅ Confirmation email sent to {} ({})",
                    transition.loan.name,
                    transition.loan.email
                );
                true
            }
            Ok(Delivery::LoggedOnly) => {
                tracing::info!(
                    "Confirmation email for loan {} logged only, not delivered",
                    loan_id
                );
                false
            }
            Err(e) => {
                tracing::error!(
                    "❌ Failed to send confirmation email to {}: {}",
                    transition.loan.email,
                    e
                );
                false
            }
        };

        let PaymentTransition { loan, payment } = transition;
        Ok(ConfirmOutcome::Paid(PaymentReceipt {
            loan_id: loan.id,
            payment_id: payment.payment_id,
            name: loan.name,
            email: loan.email,
            amount: payment.amount,
            paid_at: payment.payment_date,
            confirmation_sent,
        }))
    }

    async fn send_confirmation(
        &self,
        transition: &PaymentTransition,
    ) -> Result<Delivery, AppError> {
        let loan = &transition.loan;
        let context = json!({
            "name": loan.name,
            "loan_id": loan.id,
            "amount": format_amount(&self.currency_symbol, &transition.payment.amount),
            "paid_at": transition
                .payment
                .payment_date
                .with_timezone(&Local)
                .format("%d %B, %Y %I:%M %p")
                .to_string(),
            "sender_name": self.sender_name,
        });

        let message = EmailMessage {
            to: loan.email.clone(),
            to_name: loan.name.clone(),
            subject: format!("Payment Confirmation - Loan ID: {}", loan.id),
            html_body: self
                .templates
                .render(templates::CONFIRMATION_EMAIL_HTML, &context)?,
            text_body: self
                .templates
                .render(templates::CONFIRMATION_EMAIL_TEXT, &context)?,
        };

        self.mailer.send(&message).await
    }

    pub fn render_payment_page(&self, page: &PaymentPage) -> Result<String, AppError> {
        match page {
            PaymentPage::Due(due) => self.templates.render(
                templates::PAYMENT_PAGE,
                &json!({
                    "name": due.name,
                    "loan_id": due.loan_id,
                    "amount": format_amount(&self.currency_symbol, &due.amount),
                }),
            ),
            PaymentPage::Expired => self
                .templates
                .render(templates::PAYMENT_EXPIRED, &json!({})),
        }
    }

    pub fn render_confirm_outcome(&self, outcome: &ConfirmOutcome) -> Result<String, AppError> {
        match outcome {
            ConfirmOutcome::Paid(receipt) => self.templates.render(
                templates::PAYMENT_SUCCESS,
                &json!({
                    "name": receipt.name,
                    "email": receipt.email,
                    "loan_id": receipt.loan_id,
                    "amount": format_amount(&self.currency_symbol, &receipt.amount),
                    "paid_on": format_date(receipt.paid_at.with_timezone(&Local).date_naive()),
                    "confirmation_sent": receipt.confirmation_sent,
                }),
            ),
            ConfirmOutcome::AlreadyProcessed => self
                .templates
                .render(templates::PAYMENT_ALREADY_PROCESSED, &json!({})),
        }
    }
}
