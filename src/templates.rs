//! Page and email templates, compiled once at start-up.
//!
//! `.html` templates are auto-escaped, `.txt` templates are not.

use serde::Serialize;
use tera::Tera;

use crate::errors::AppError;

pub const PAYMENT_PAGE: &str = "payment_page.html";
pub const PAYMENT_EXPIRED: &str = "payment_expired.html";
pub const PAYMENT_SUCCESS: &str = "payment_success.html";
pub const PAYMENT_ALREADY_PROCESSED: &str = "payment_already_processed.html";
pub const REMINDER_EMAIL_HTML: &str = "reminder_email.html";
pub const REMINDER_EMAIL_TEXT: &str = "reminder_email.txt";
pub const CONFIRMATION_EMAIL_HTML: &str = "confirmation_email.html";
pub const CONFIRMATION_EMAIL_TEXT: &str = "confirmation_email.txt";

const SOURCES: [(&str, &str); 9] = [
    ("base_page.html", include_str!("../templates/base_page.html")),
    (PAYMENT_PAGE, include_str!("../templates/payment_page.html")),
    (PAYMENT_EXPIRED, include_str!("../templates/payment_expired.html")),
    (PAYMENT_SUCCESS, include_str!("../templates/payment_success.html")),
    (
        PAYMENT_ALREADY_PROCESSED,
        include_str!("../templates/payment_already_processed.html"),
    ),
    (REMINDER_EMAIL_HTML, include_str!("../templates/reminder_email.html")),
    (REMINDER_EMAIL_TEXT, include_str!("../templates/reminder_email.txt")),
    (
        CONFIRMATION_EMAIL_HTML,
        include_str!("../templates/confirmation_email.html"),
    ),
    (
        CONFIRMATION_EMAIL_TEXT,
        include_str!("../templates/confirmation_email.txt"),
    ),
];

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, AppError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(SOURCES.to_vec())?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &impl Serialize) -> Result<String, AppError> {
        let context = tera::Context::from_serialize(context)?;
        Ok(self.tera.render(name, &context)?)
    }
}
