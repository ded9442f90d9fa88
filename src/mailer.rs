use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, MailTransport};
use crate::errors::AppError;

/// A rendered email ready to hand to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// What happened to a message the transport did not reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The relay accepted the message for delivery.
    Accepted,
    /// Written to the log only. Nobody was contacted.
    LoggedOnly,
}

impl Delivery {
    pub fn reached_recipient(&self) -> bool {
        matches!(self, Delivery::Accepted)
    }
}

/// Outbound mail capability. One attempt per call; callers decide what a
/// failure means.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, AppError>;
}

pub type MailerRef = Arc<dyn Mailer>;

/// Picks the transport from configuration. The logging mailer is used only
/// when `MAIL_TRANSPORT=log` was selected; a relay transport without a relay
/// is a configuration error.
pub fn from_config(config: &Config) -> Result<MailerRef, AppError> {
    match config.mail_transport {
        MailTransport::Log => Ok(Arc::new(LogMailer::new(config.sender_email.clone()))),
        MailTransport::Relay => match (&config.mail_api_url, &config.mail_api_token) {
            (Some(url), Some(token)) => Ok(Arc::new(HttpMailer::new(
                url.clone(),
                token.clone(),
                config.sender_email.clone(),
                config.sender_name.clone(),
            )?)),
            (Some(_), None) => Err(AppError::ConfigError(
                "MAIL_API_TOKEN is required when MAIL_API_URL is set".to_string(),
            )),
            (None, _) => Err(AppError::ConfigError(
                "MAIL_API_URL is required unless MAIL_TRANSPORT=log".to_string(),
            )),
        },
    }
}

/// Client for a transactional mail relay that accepts JSON over HTTPS.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    sender_email: String,
    sender_name: String,
}

impl HttpMailer {
    /// Creates a new `HttpMailer`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Full URL of the relay's send endpoint.
    /// * `token` - Bearer token for the relay.
    /// * `sender_email` - Address the messages are sent from.
    /// * `sender_name` - Display name for the sender.
    pub fn new(
        endpoint: String,
        token: String,
        sender_email: String,
        sender_name: String,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::MailError(format!("Failed to create mail client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            token,
            sender_email,
            sender_name,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, AppError> {
        let payload = json!({
            "from": { "email": self.sender_email, "name": self.sender_name },
            "to": [{ "email": message.to, "name": message.to_name }],
            "subject": message.subject,
            "html": message.html_body,
            "text": message.text_body,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::MailError(format!("Mail relay request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::MailError(format!(
                "Mail relay returned {}: {}",
                status, error_text
            )));
        }

        tracing::debug!("Mail relay accepted message to {}", message.to);
        Ok(Delivery::Accepted)
    }
}

/// Logs messages instead of sending them. Selected with `MAIL_TRANSPORT=log`
/// for local runs; every send reports `Delivery::LoggedOnly`.
#[derive(Clone)]
pub struct LogMailer {
    sender_email: String,
}

impl LogMailer {
    pub fn new(sender_email: String) -> Self {
        Self { sender_email }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, AppError> {
        tracing::info!(
            from = %self.sender_email,
            to = %message.to,
            subject = %message.subject,
            "MAIL_TRANSPORT=log, message logged only"
        );
        tracing::debug!("Message body:\n{}", message.text_body);
        Ok(Delivery::LoggedOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(transport: MailTransport, url: Option<&str>, token: Option<&str>) -> Config {
        Config {
            database_url: "postgres://localhost/loans".to_string(),
            port: 8000,
            base_url: "http://localhost:8000".to_string(),
            sender_email: "loans@example.com".to_string(),
            sender_name: "Loan Department".to_string(),
            mail_transport: transport,
            mail_api_url: url.map(str::to_string),
            mail_api_token: token.map(str::to_string),
            currency_symbol: "₹".to_string(),
        }
    }

    const RELAY: Option<&str> = Some("https://mail.example.com/send");

    #[test]
    fn test_from_config_requires_token_with_url() {
        assert!(from_config(&config(MailTransport::Relay, RELAY, None)).is_err());
        assert!(from_config(&config(MailTransport::Relay, RELAY, Some("t"))).is_ok());
    }

    #[test]
    fn test_from_config_without_relay_needs_log_transport() {
        let err = from_config(&config(MailTransport::Relay, None, None)).err();
        assert!(matches!(err, Some(AppError::ConfigError(_))));

        assert!(from_config(&config(MailTransport::Log, None, None)).is_ok());
    }

    #[tokio::test]
    async fn test_log_mailer_reports_logged_only() {
        let mailer = LogMailer::new("loans@example.com".to_string());
        let message = EmailMessage {
            to: "asha@example.com".to_string(),
            to_name: "Asha".to_string(),
            subject: "Hello".to_string(),
            html_body: "<p>Hi</p>".to_string(),
            text_body: "Hi".to_string(),
        };
        let delivery = mailer.send(&message).await.unwrap();
        assert_eq!(delivery, Delivery::LoggedOnly);
        assert!(!delivery.reached_recipient());
    }
}
