use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::errors::AppError;
use crate::payments::{parse_loan_ref, ConfirmOutcome, PaymentPage, PaymentService};

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Payment transition handler.
    pub payments: PaymentService,
}

/// The public payment routes, left unlayered so the server can wrap them in
/// rate limiting.
pub fn payment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pay/:loan_id", get(payment_page))
        .route("/pay/confirm/:loan_id", post(confirm_payment))
}

/// Payment routes plus the health check, without transport-level layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(payment_routes())
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "loan-reminders",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /pay/:loan_id
///
/// Shows the amount due, or the expired page when the loan is paid or unknown.
pub async fn payment_page(
    State(state): State<Arc<AppState>>,
    Path(loan_ref): Path<String>,
) -> Result<Html<String>, AppError> {
    tracing::info!("GET /pay/{}", loan_ref);

    let page = match parse_loan_ref(&loan_ref) {
        Some(loan_id) => state.payments.show_payment_page(loan_id).await?,
        None => PaymentPage::Expired,
    };

    Ok(Html(state.payments.render_payment_page(&page)?))
}

/// POST /pay/confirm/:loan_id
///
/// The only state-changing route. A replayed confirmation renders the
/// already-processed page with 200.
pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Path(loan_ref): Path<String>,
) -> Result<Html<String>, AppError> {
    tracing::info!("POST /pay/confirm/{}", loan_ref);

    let outcome = match parse_loan_ref(&loan_ref) {
        Some(loan_id) => state.payments.confirm_payment(loan_id).await?,
        None => ConfirmOutcome::AlreadyProcessed,
    };

    Ok(Html(state.payments.render_confirm_outcome(&outcome)?))
}
