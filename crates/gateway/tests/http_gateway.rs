//! Integration tests for the HTTP gateway against a local counterparty stub.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio_util::sync::CancellationToken;

use common::PaymentId;
use gateway::{GatewayError, HttpPaymentGateway, PaymentGateway, RetryPolicy};

#[derive(Clone, Default)]
struct StubState {
    transfer_calls: Arc<AtomicU32>,
    // Number of 503 responses to serve before succeeding
    transfer_failures: Arc<AtomicU32>,
    transfer_status: Arc<std::sync::RwLock<String>>,
    transfer_http_status: Arc<AtomicU32>,
}

async fn sepa(
    State(state): State<StubState>,
    Path(_payment_id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.transfer_calls.fetch_add(1, Ordering::SeqCst);

    let fixed = state.transfer_http_status.load(Ordering::SeqCst);
    if fixed != 0 {
        return (
            StatusCode::from_u16(fixed as u16).unwrap(),
            Json(serde_json::json!({})),
        );
    }

    if state
        .transfer_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({})));
    }

    let status = state.transfer_status.read().unwrap().clone();
    (StatusCode::OK, Json(serde_json::json!({ "status": status })))
}

async fn reserve(Path(_payment_id): Path<String>) -> StatusCode {
    StatusCode::ACCEPTED
}

async fn released() -> StatusCode {
    StatusCode::OK
}

async fn cancel(
    Path(_payment_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    assert!(body.get("reason").is_some());
    StatusCode::OK
}

async fn start_stub(state: StubState) -> String {
    let app = Router::new()
        .route("/api/payment/sepa/{payment_id}", get(sepa))
        .route("/api/payment/reserve/{payment_id}", post(reserve))
        .route("/api/payment/fraud-check/{payment_id}", get(|| async { StatusCode::OK }))
        .route("/api/payment/released", get(released))
        .route("/api/payment/cancel/{payment_id}", post(cancel))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn transfer_happy_path() {
    let stub = StubState::default();
    *stub.transfer_status.write().unwrap() = "continue".to_string();
    let base_url = start_stub(stub.clone()).await;

    let gateway = HttpPaymentGateway::new(base_url).with_retry_policy(fast_retry());
    let outcome = gateway
        .execute_transfer(&PaymentId::new("PAY-1"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.is_continue());
    assert_eq!(stub.transfer_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transfer_retries_5xx_then_succeeds() {
    let stub = StubState::default();
    *stub.transfer_status.write().unwrap() = "continue".to_string();
    stub.transfer_failures.store(2, Ordering::SeqCst);
    let base_url = start_stub(stub.clone()).await;

    let gateway = HttpPaymentGateway::new(base_url).with_retry_policy(fast_retry());
    let outcome = gateway
        .execute_transfer(&PaymentId::new("PAY-1"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.is_continue());
    assert_eq!(stub.transfer_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn transfer_4xx_is_non_retryable() {
    let stub = StubState::default();
    stub.transfer_http_status.store(422, Ordering::SeqCst);
    let base_url = start_stub(stub.clone()).await;

    let gateway = HttpPaymentGateway::new(base_url).with_retry_policy(fast_retry());
    let err = gateway
        .execute_transfer(&PaymentId::new("PAY-1"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Client { status: 422, .. }));
    assert_eq!(stub.transfer_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transfer_exhausts_retries_on_persistent_5xx() {
    let stub = StubState::default();
    stub.transfer_http_status.store(500, Ordering::SeqCst);
    let base_url = start_stub(stub.clone()).await;

    let gateway = HttpPaymentGateway::new(base_url).with_retry_policy(fast_retry());
    let err = gateway
        .execute_transfer(&PaymentId::new("PAY-1"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::RetriesExhausted { attempts: 3, .. }
    ));
    assert_eq!(stub.transfer_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn reservation_publications_and_fraud_check_round_trip() {
    let base_url = start_stub(StubState::default()).await;
    let gateway = HttpPaymentGateway::new(base_url);
    let id = PaymentId::new("PAY-7");

    gateway.fraud_check(&id).await.unwrap();
    gateway.submit_reservation(&id).await.unwrap();
    gateway.publish_completed(&id).await.unwrap();
    gateway
        .publish_rejected(&id, "Reservation timed out")
        .await
        .unwrap();
}

#[tokio::test]
async fn transport_failure_is_retryable_and_exhausts() {
    // Nothing listens on this address.
    let gateway =
        HttpPaymentGateway::new("http://127.0.0.1:1").with_retry_policy(fast_retry());
    let err = gateway
        .execute_transfer(&PaymentId::new("PAY-1"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::RetriesExhausted { .. }));
}
