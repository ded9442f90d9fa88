use std::fmt::Display;
use url::Url;

use crate::errors::AppError;

/// Builds `<base>/pay/<identifier>` links for reminder emails.
///
/// The identifier is pushed as a single path segment, so anything that is not
/// a safe segment character gets percent-encoded. Integer keys pass through
/// unchanged.
#[derive(Debug, Clone)]
pub struct PaymentLinkBuilder {
    base: Url,
}

impl PaymentLinkBuilder {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base = Url::parse(base_url.trim()).map_err(|e| {
            AppError::ConfigError(format!("Invalid payment link base '{}': {}", base_url, e))
        })?;

        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(AppError::ConfigError(format!(
                "Payment link base must be an absolute http(s) URL, got '{}'",
                base_url
            )));
        }

        Ok(Self { base })
    }

    pub fn link_for(&self, loan_ref: impl Display) -> String {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("pay")
                .push(&loan_ref.to_string());
        }
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_for_integer_id() {
        let builder = PaymentLinkBuilder::new("https://pay.example.com").unwrap();
        assert_eq!(builder.link_for(42), "https://pay.example.com/pay/42");
    }

    #[test]
    fn test_link_keeps_base_path_and_port() {
        let builder = PaymentLinkBuilder::new("http://localhost:5000/loans/").unwrap();
        assert_eq!(builder.link_for(7), "http://localhost:5000/loans/pay/7");
    }

    #[test]
    fn test_link_encodes_unsafe_segments() {
        let builder = PaymentLinkBuilder::new("https://pay.example.com").unwrap();
        assert_eq!(
            builder.link_for("a b/c?d"),
            "https://pay.example.com/pay/a%20b%2Fc%3Fd"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(PaymentLinkBuilder::new("mailto:loans@example.com").is_err());
        assert!(PaymentLinkBuilder::new("not a url").is_err());
    }
}
