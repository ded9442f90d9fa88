/// HTTP route tests driven through the router with tower's oneshot
mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

use common::{payment_service, unpaid_loan, RecordingMailer};
use loan_reminders::handlers::{router, AppState};
use loan_reminders::memory_store::InMemoryLoanStore;
use loan_reminders::models::PaymentStatus;

fn app(store: &InMemoryLoanStore, mailer: Arc<RecordingMailer>) -> Router {
    router(Arc::new(AppState {
        payments: payment_service(store, mailer),
    }))
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_health() {
    let store = InMemoryLoanStore::new();
    let (status, body) = send(app(&store, RecordingMailer::new()), "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_get_payment_page_for_unpaid_loan() {
    let store = InMemoryLoanStore::with_loans([unpaid_loan(
        7,
        "Asha",
        "asha@example.com",
        "1500.00",
        None,
    )]);
    let (status, body) = send(app(&store, RecordingMailer::new()), "GET", "/pay/7").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Hello, Asha"));
    assert!(body.contains("₹1500.00"));
    assert!(body.contains(r#"action="/pay/confirm/7""#));
    assert!(body.contains(r#"method="POST""#));

    // Viewing never changes state
    assert_eq!(
        store.get_loan(7).await.unwrap().payment_status,
        PaymentStatus::Unpaid
    );
}

#[tokio::test]
async fn test_get_payment_page_escapes_customer_name() {
    let store = InMemoryLoanStore::with_loans([unpaid_loan(
        8,
        "<b>Ravi</b>",
        "ravi@example.com",
        "10",
        None,
    )]);
    let (status, body) = send(app(&store, RecordingMailer::new()), "GET", "/pay/8").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("<b>Ravi</b>"));
    assert!(body.contains("&lt;b&gt;Ravi"));
}

#[tokio::test]
async fn test_get_unknown_or_malformed_loan_is_expired() {
    let store = InMemoryLoanStore::new();

    for uri in ["/pay/404", "/pay/not-a-number", "/pay/1%20OR%201=1"] {
        let (status, body) = send(app(&store, RecordingMailer::new()), "GET", uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert!(body.contains("Payment Link Expired"), "{}", uri);
    }
}

#[tokio::test]
async fn test_confirm_then_replay() {
    let store = InMemoryLoanStore::with_loans([unpaid_loan(
        7,
        "Asha",
        "asha@example.com",
        "1500.00",
        None,
    )]);
    let mailer = RecordingMailer::new();

    let (status, body) = send(app(&store, mailer.clone()), "POST", "/pay/confirm/7").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment Successful!"));
    assert!(body.contains("asha@example.com"));
    assert!(body.contains("₹1500.00"));

    let (status, body) = send(app(&store, mailer.clone()), "POST", "/pay/confirm/7").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment Already Processed"));

    let (_, body) = send(app(&store, mailer.clone()), "GET", "/pay/7").await;
    assert!(body.contains("Payment Link Expired"));

    assert_eq!(store.payments_for(7).await.len(), 1);
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_confirm_store_failure_is_server_error() {
    let store = InMemoryLoanStore::with_loans([unpaid_loan(
        9,
        "Meera",
        "meera@example.com",
        "50",
        None,
    )]);
    store.fail_payment_inserts(true);

    let (status, body) = send(app(&store, RecordingMailer::new()), "POST", "/pay/confirm/9").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("simulated failure"));
    assert_eq!(
        store.get_loan(9).await.unwrap().payment_status,
        PaymentStatus::Unpaid
    );
}

#[tokio::test]
async fn test_confirm_requires_post() {
    let store = InMemoryLoanStore::with_loans([unpaid_loan(
        7,
        "Asha",
        "asha@example.com",
        "1500.00",
        None,
    )]);

    let (status, _) = send(app(&store, RecordingMailer::new()), "GET", "/pay/confirm/7").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        store.get_loan(7).await.unwrap().payment_status,
        PaymentStatus::Unpaid
    );
}
