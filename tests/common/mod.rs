//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use loan_reminders::errors::AppError;
use loan_reminders::mailer::{Delivery, EmailMessage, Mailer};
use loan_reminders::memory_store::InMemoryLoanStore;
use loan_reminders::models::{Loan, PaymentStatus};
use loan_reminders::payment_link::PaymentLinkBuilder;
use loan_reminders::payments::PaymentService;
use loan_reminders::reminders::ReminderDispatcher;
use loan_reminders::templates::Templates;

/// Records every message instead of sending it. Addresses registered with
/// `fail_for` are rejected the way a relay would reject them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<HashSet<String>>,
    fail_all: Mutex<bool>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub fn fail_everything(&self) {
        *self.fail_all.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, AppError> {
        if *self.fail_all.lock().unwrap() || self.failing.lock().unwrap().contains(&message.to) {
            return Err(AppError::MailError(format!(
                "relay rejected message to {}",
                message.to
            )));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(Delivery::Accepted)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn unpaid_loan(id: i64, name: &str, email: &str, amount: &str, due: Option<NaiveDate>) -> Loan {
    Loan {
        id,
        name: name.to_string(),
        email: email.to_string(),
        amount: BigDecimal::from_str(amount).unwrap(),
        due_date: due,
        payment_status: PaymentStatus::Unpaid,
        paid_at: None,
    }
}

pub fn templates() -> Arc<Templates> {
    Arc::new(Templates::new().unwrap())
}

pub fn payment_service(store: &InMemoryLoanStore, mailer: Arc<RecordingMailer>) -> PaymentService {
    PaymentService::new(
        Arc::new(store.clone()),
        mailer,
        templates(),
        "Loan Department".to_string(),
        "₹".to_string(),
    )
}

pub fn dispatcher(store: &InMemoryLoanStore, mailer: Arc<RecordingMailer>) -> ReminderDispatcher {
    ReminderDispatcher::new(
        Arc::new(store.clone()),
        mailer,
        templates(),
        PaymentLinkBuilder::new("https://pay.example.com").unwrap(),
        "Loan Department".to_string(),
        "₹".to_string(),
    )
}
