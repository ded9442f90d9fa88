use chrono::{Local, NaiveDate, Utc};
use regex::Regex;
use serde_json::json;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::errors::{AppError, ResultExt};
use crate::mailer::{Delivery, EmailMessage, MailerRef};
use crate::models::{format_amount, format_date, EmailLogEntry, Loan};
use crate::payment_link::PaymentLinkBuilder;
use crate::store::LoanStoreRef;
use crate::templates::{self, Templates};
use crate::urgency;

/// Counts reported at the end of a reminder pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderSummary {
    /// Unpaid loans found.
    pub total: usize,
    /// Accepted by the mail relay and recorded in the email log.
    pub sent: usize,
    pub failed: usize,
    /// Rendered and logged under `MAIL_TRANSPORT=log`; not delivered, not recorded.
    pub logged_only: usize,
}

impl fmt::Display for ReminderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "📊 SUMMARY")?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "✅ Successfully sent: {}", self.sent)?;
        writeln!(f, "❌ Failed: {}", self.failed)?;
        if self.logged_only > 0 {
            writeln!(f, "📝 Logged only (not delivered): {}", self.logged_only)?;
        }
        writeln!(f, "📊 Total processed: {}", self.total)?;
        write!(f, "{}", "=".repeat(50))
    }
}

/// Minimal shape check for a contact address: something on each side of a
/// single `@`, no whitespace.
///
/// Only blank or `@`-less values are stopped here. Internationalized
/// addresses pass, and the relay remains the authority on deliverability.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+$").expect("email regex is valid")
    });

    regex.is_match(email.trim())
}

/// Sends a reminder to every customer with an unpaid loan.
///
/// Read-and-notify only: it never touches payment status, so running it again
/// just repeats the reminders.
pub struct ReminderDispatcher {
    store: LoanStoreRef,
    mailer: MailerRef,
    templates: Arc<Templates>,
    links: PaymentLinkBuilder,
    sender_name: String,
    currency_symbol: String,
}

impl ReminderDispatcher {
    pub fn new(
        store: LoanStoreRef,
        mailer: MailerRef,
        templates: Arc<Templates>,
        links: PaymentLinkBuilder,
        sender_name: String,
        currency_symbol: String,
    ) -> Self {
        Self {
            store,
            mailer,
            templates,
            links,
            sender_name,
            currency_symbol,
        }
    }

    pub async fn run_reminder_pass(&self) -> Result<ReminderSummary, AppError> {
        self.run_for_date(Local::now().date_naive()).await
    }

    /// Runs one pass as if the current date were `today`.
    ///
    /// Only failing to list the unpaid loans aborts the pass. A failure for a
    /// single loan is counted and the loop moves on.
    pub async fn run_for_date(&self, today: NaiveDate) -> Result<ReminderSummary, AppError> {
        let loans = self
            .store
            .list_unpaid()
            .await
            .context("Failed to fetch unpaid loans")?;

        let mut summary = ReminderSummary {
            total: loans.len(),
            ..ReminderSummary::default()
        };

        if loans.is_empty() {
            tracing::info!("✅ No pending payments found. No emails sent.");
            return Ok(summary);
        }

        tracing::info!("📊 Found {} customers with pending payments", loans.len());

        for loan in &loans {
            if let Some(days) = urgency::days_until_due(loan.due_date, today) {
                if days < 0 {
                    tracing::warn!("⚠️  {}: Payment is {} day(s) overdue", loan.name, -days);
                }
            }

            tracing::info!(
                "📨 Processing: {} ({}) - {}",
                loan.name,
                loan.email,
                format_amount(&self.currency_symbol, &loan.amount)
            );

            match self.remind(loan, today).await {
                Ok(Delivery::LoggedOnly) => {
                    summary.logged_only += 1;
                    tracing::info!("   📝 Email logged only, nothing recorded");
                }
                Ok(Delivery::Accepted) => {
                    summary.sent += 1;
                    tracing::info!("   ✅ Email sent successfully");

                    let entry = EmailLogEntry::sent(loan.id, Utc::now());
                    if let Err(e) = self.store.log_email(&entry).await {
                        tracing::warn!("⚠️ Failed to log email for ID {}: {}", loan.id, e);
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("   ❌ Failed to send email to {}: {}", loan.email, e);
                }
            }
        }

        tracing::info!(
            total = summary.total,
            sent = summary.sent,
            failed = summary.failed,
            logged_only = summary.logged_only,
            "Reminder pass finished"
        );

        Ok(summary)
    }

    async fn remind(&self, loan: &Loan, today: NaiveDate) -> Result<Delivery, AppError> {
        if !is_valid_email(&loan.email) {
            return Err(AppError::MailError(format!(
                "Invalid contact address for loan {}",
                loan.id
            )));
        }

        let message = self.build_reminder(loan, today)?;
        self.mailer.send(&message).await
    }

    /// Renders the reminder email for one loan.
    pub fn build_reminder(&self, loan: &Loan, today: NaiveDate) -> Result<EmailMessage, AppError> {
        let urgency = urgency::classify(loan.due_date, today);
        let amount = format_amount(&self.currency_symbol, &loan.amount);
        let due_date = loan
            .due_date
            .map(format_date)
            .unwrap_or_else(|| "Not specified".to_string());

        let context = json!({
            "name": loan.name,
            "loan_id": loan.id,
            "amount": amount,
            "due_date": due_date,
            "is_overdue": urgency::is_overdue(loan.due_date, today),
            "days_remaining": urgency::days_until_due(loan.due_date, today),
            "urgency": urgency.as_str(),
            "is_urgent": urgency.is_urgent(),
            "status_label": urgency::due_status_label(loan.due_date, today),
            "payment_link": self.links.link_for(loan.id),
            "sender_name": self.sender_name,
        });

        let subject = match loan.due_date {
            Some(_) => format!("Payment Reminder: {} due on {}", amount, due_date),
            None => format!("Payment Reminder: {} (due date not specified)", amount),
        };

        Ok(EmailMessage {
            to: loan.email.trim().to_string(),
            to_name: loan.name.clone(),
            subject,
            html_body: self
                .templates
                .render(templates::REMINDER_EMAIL_HTML, &context)?,
            text_body: self
                .templates
                .render(templates::REMINDER_EMAIL_TEXT, &context)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user+tag@example.co.uk"));
        assert!(is_valid_email(" padded@example.com "));
        assert!(is_valid_email("josé@example.com"));
        assert!(is_valid_email("user@localhost"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("   "));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email("a@b@example.com"));
    }

    #[test]
    fn test_summary_display() {
        let summary = ReminderSummary {
            total: 3,
            sent: 2,
            failed: 1,
            logged_only: 0,
        };
        let printed = summary.to_string();
        assert!(printed.contains("Successfully sent: 2"));
        assert!(printed.contains("Failed: 1"));
        assert!(printed.contains("Total processed: 3"));
        assert!(!printed.contains("Logged only"));
    }
}
