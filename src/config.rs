use serde::Deserialize;
use std::str::FromStr;

/// How outbound mail leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Deliver through the HTTP mail relay. Requires `MAIL_API_URL` and `MAIL_API_TOKEN`.
    Relay,
    /// Log messages without delivering them. Must be chosen explicitly.
    Log,
}

impl FromStr for MailTransport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relay" => Ok(MailTransport::Relay),
            "log" => Ok(MailTransport::Log),
            other => anyhow::bail!("MAIL_TRANSPORT must be 'relay' or 'log', got '{}'", other),
        }
    }
}

/// Process configuration, read once at start-up and passed by reference.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Public address the payment links point at.
    pub base_url: String,
    pub sender_email: String,
    pub sender_name: String,
    pub mail_transport: MailTransport,
    /// Transactional mail relay endpoint.
    pub mail_api_url: Option<String>,
    pub mail_api_token: Option<String>,
    pub currency_symbol: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mail_transport: MailTransport = std::env::var("MAIL_TRANSPORT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<MailTransport>())
            .transpose()?
            .unwrap_or(MailTransport::Relay);

        let mail_api_url = std::env::var("MAIL_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|url| {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("MAIL_API_URL must start with http:// or https://");
                }
                Ok(url)
            })
            .transpose()?;

        let mail_api_token = std::env::var("MAIL_API_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty());
        if mail_api_url.is_some() && mail_api_token.is_none() {
            anyhow::bail!("MAIL_API_TOKEN is required when MAIL_API_URL is set");
        }

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string())
                .trim()
                .to_string(),
            sender_email: std::env::var("SENDER_EMAIL")
                .or_else(|_| std::env::var("EMAIL"))
                .map_err(|_| anyhow::anyhow!("SENDER_EMAIL or EMAIL environment variable required"))
                .and_then(|email| {
                    if email.trim().is_empty() {
                        anyhow::bail!("SENDER_EMAIL cannot be empty");
                    }
                    Ok(email)
                })?,
            sender_name: std::env::var("SENDER_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "Loan Department".to_string()),
            mail_transport,
            mail_api_url,
            mail_api_token,
            currency_symbol: std::env::var("CURRENCY_SYMBOL").unwrap_or_else(|_| "₹".to_string()),
        };

        config.validate()?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            config.database_url.chars().take(20).collect::<String>()
        );
        tracing::debug!("Payment link base URL: {}", config.base_url);
        match (config.mail_transport, &config.mail_api_url) {
            (MailTransport::Relay, Some(url)) => tracing::info!("Mail relay configured: {}", url),
            _ => tracing::warn!("MAIL_TRANSPORT=log, emails will only be logged"),
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Checks the values that `from_env` cannot check field by field.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mail_transport == MailTransport::Relay && self.mail_api_url.is_none() {
            anyhow::bail!("MAIL_API_URL is required unless MAIL_TRANSPORT=log");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("BASE_URL must start with http:// or https://");
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("BASE_URL is not a valid URL: {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database_url: "postgres://localhost/loans".to_string(),
            port: 8000,
            base_url: "https://pay.example.com".to_string(),
            sender_email: "loans@example.com".to_string(),
            sender_name: "Loan Department".to_string(),
            mail_transport: MailTransport::Relay,
            mail_api_url: Some("https://mail.example.com/send".to_string()),
            mail_api_token: Some("relay-token".to_string()),
            currency_symbol: "₹".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_https_base() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_base() {
        let mut config = sample();
        config.base_url = "pay.example.com".to_string();
        assert!(config.validate().is_err());

        config.base_url = "ftp://pay.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_relay_unless_log_selected() {
        let mut config = sample();
        config.mail_api_url = None;
        config.mail_api_token = None;
        assert!(config.validate().is_err());

        config.mail_transport = MailTransport::Log;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mail_transport_parse() {
        assert_eq!("relay".parse::<MailTransport>().unwrap(), MailTransport::Relay);
        assert_eq!(" LOG ".parse::<MailTransport>().unwrap(), MailTransport::Log);
        assert!("smtp".parse::<MailTransport>().is_err());
    }
}
