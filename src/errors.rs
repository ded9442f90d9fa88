use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::error::Error as _;
use std::fmt;

/// Static failure page. Carries no request data, so it needs no escaping.
const FAILURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Payment Error</title></head>
<body style="font-family: sans-serif; text-align: center; margin-top: 50px;">
    <h2 style="color: #dc3545;">Something went wrong</h2>
    <p>We could not complete your request. Please reload the payment link to check its current status before trying again.</p>
</body>
</html>"#;

/// Application-specific error types.
///
/// Only operational faults live here. Expected empty outcomes (an already paid
/// or unknown loan) are ordinary values of the payment types and never reach
/// this enum.
#[derive(Debug)]
pub enum AppError {
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Store fault that did not come from sqlx (bad row data, injected faults).
    StoreError(String),
    /// Error handing a message to the mail relay.
    MailError(String),
    /// Template compilation or rendering error.
    TemplateError(String),
    /// Invalid configuration value detected while wiring components.
    ConfigError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::StoreError(msg) => write!(f, "Store error: {}", msg),
            AppError::MailError(msg) => write!(f, "Mail error: {}", msg),
            AppError::TemplateError(msg) => write!(f, "Template error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status used when this error reaches a handler boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MailError(_) => StatusCode::BAD_GATEWAY,
            AppError::WithContext { source, .. } => source.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into the generic failure page.
    ///
    /// Details are logged, never shown to the payer.
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::DatabaseError(e) => tracing::error!("Database error: {:?}", e),
            AppError::StoreError(msg) => tracing::error!("Store error: {}", msg),
            AppError::MailError(msg) => tracing::error!("Mail error: {}", msg),
            AppError::TemplateError(msg) => tracing::error!("Template error: {}", msg),
            AppError::ConfigError(msg) => tracing::error!("Configuration error: {}", msg),
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source)
            }
        }

        (status, Html(FAILURE_PAGE)).into_response()
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        // tera nests the useful message in the source chain
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        AppError::TemplateError(message)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: f(),
        })
    }
}
