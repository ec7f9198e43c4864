//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use gateway::InMemoryPaymentGateway;
use journal::InMemoryJournal;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::SagaCoordinator;
use tower::ServiceExt;

use api::routes::payments::AppState;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    let (app, _, _) = setup_with_parts();
    app
}

fn setup_with_parts() -> (
    Router,
    Arc<AppState<InMemoryJournal, InMemoryPaymentGateway>>,
    InMemoryPaymentGateway,
) {
    let journal = InMemoryJournal::new();
    let gateway = InMemoryPaymentGateway::new();
    let coordinator = Arc::new(SagaCoordinator::new(journal, gateway.clone()));
    let state = api::create_state(coordinator);
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state, gateway)
}

fn payment_body(id: &str) -> serde_json::Value {
    serde_json::json!({
        "payment_id": id,
        "amount": "150.25",
        "currency": "EUR",
        "debtor_account": "LT601010012345678901",
        "creditor_account": "LT601010098765432109"
    })
}

async fn post_json(app: &Router, uri: &str, body: &serde_json::Value) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Polls the status endpoint until the saga reports a terminal status.
async fn wait_for_status(app: &Router, id: &str) -> serde_json::Value {
    for _ in 0..500 {
        let response = get(app, &format!("/payments/{id}")).await;
        if response.status() == StatusCode::OK {
            let json = json_body(response).await;
            if !json["status"].is_null() {
                return json;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("payment {id} never reached a terminal status");
}

#[tokio::test]
async fn health_check() {
    let app = setup();

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "payment-orchestrator");
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let app = setup();

    let response = get(&app, "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn accept_payment_returns_saga_id() {
    let app = setup();

    let response = post_json(&app, "/payments", &payment_body("PAY-1")).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = json_body(response).await;
    assert_eq!(json["saga_id"], "payment-saga-PAY-1");
}

#[tokio::test]
async fn duplicate_payment_is_a_conflict() {
    let app = setup();

    let first = post_json(&app, "/payments", &payment_body("PAY-2")).await;
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = post_json(&app, "/payments", &payment_body("PAY-2")).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let json = json_body(second).await;
    assert!(json["error"].as_str().unwrap().contains("already started"));
}

#[tokio::test]
async fn empty_payment_id_is_a_bad_request() {
    let app = setup();

    let response = post_json(&app, "/payments", &payment_body("")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_payment_body_is_rejected() {
    let app = setup();

    let response = post_json(
        &app,
        "/payments",
        &serde_json::json!({ "payment_id": "PAY-3" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn status_of_unknown_payment_is_not_found() {
    let app = setup();

    let response = get(&app, "/payments/PAY-404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signal_for_unknown_payment_is_acknowledged_but_not_signaled() {
    let app = setup();

    let response = post_json(
        &app,
        "/payments/PAY-404/reservation-result",
        &serde_json::json!({ "success": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["signaled"], false);
}

#[tokio::test]
async fn confirmed_payment_runs_to_completion() {
    let (app, _, gateway) = setup_with_parts();

    post_json(&app, "/payments", &payment_body("PAY-10")).await;

    let ack = post_json(
        &app,
        "/payments/PAY-10/reservation-result",
        &serde_json::json!({ "success": true }),
    )
    .await;
    assert_eq!(json_body(ack).await["signaled"], true);

    let status = wait_for_status(&app, "PAY-10").await;
    assert_eq!(status["state"], "Completed");
    assert_eq!(status["status"], "COMPLETED");
    assert!(status["message"].is_null());
    assert_eq!(gateway.publication_count(), 1);
}

#[tokio::test]
async fn rejected_reservation_fails_the_payment() {
    let (app, _, gateway) = setup_with_parts();

    post_json(&app, "/payments", &payment_body("PAY-11")).await;
    post_json(
        &app,
        "/payments/PAY-11/reservation-result",
        &serde_json::json!({ "success": false, "reason": "insufficient funds" }),
    )
    .await;

    let status = wait_for_status(&app, "PAY-11").await;
    assert_eq!(status["status"], "FAILED");
    assert_eq!(status["message"], "insufficient funds");
    assert_eq!(
        gateway.rejected_publications()[0].1,
        "insufficient funds".to_string()
    );
}

#[tokio::test]
async fn duplicate_signal_is_acknowledged_without_effect() {
    let (app, _, _) = setup_with_parts();

    post_json(&app, "/payments", &payment_body("PAY-12")).await;

    let first = post_json(
        &app,
        "/payments/PAY-12/reservation-result",
        &serde_json::json!({ "success": true }),
    )
    .await;
    let second = post_json(
        &app,
        "/payments/PAY-12/reservation-result",
        &serde_json::json!({ "success": false, "reason": "too late" }),
    )
    .await;

    assert_eq!(json_body(first).await["signaled"], true);
    assert_eq!(json_body(second).await["signaled"], false);

    let status = wait_for_status(&app, "PAY-12").await;
    assert_eq!(status["status"], "COMPLETED");
}

#[tokio::test]
async fn in_flight_payment_reports_its_state_without_a_status() {
    let (app, _, _) = setup_with_parts();

    post_json(&app, "/payments", &payment_body("PAY-13")).await;
    // Let the saga task reach its signal wait.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let response = get(&app, "/payments/PAY-13").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["payment_id"], "PAY-13");
    assert_eq!(json["state"], "AwaitingConfirmation");
    assert!(json["status"].is_null());
}
