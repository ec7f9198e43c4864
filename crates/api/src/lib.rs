//! HTTP API server with observability for the payment orchestrator.
//!
//! Provides REST endpoints for starting payment sagas and forwarding
//! reservation callbacks, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use gateway::{InMemoryPaymentGateway, PaymentGateway};
use journal::{InMemoryJournal, SagaJournal};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::SagaCoordinator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::payments::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<J, G>(state: Arc<AppState<J, G>>, metrics_handle: PrometheusHandle) -> Router
where
    J: SagaJournal + 'static,
    G: PaymentGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/payments", post(routes::payments::create::<J, G>))
        .route("/payments/{id}", get(routes::payments::get::<J, G>))
        .route(
            "/payments/{id}/reservation-result",
            post(routes::payments::reservation_result::<J, G>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state around an existing coordinator.
pub fn create_state<J, G>(coordinator: Arc<SagaCoordinator<J, G>>) -> Arc<AppState<J, G>>
where
    J: SagaJournal + 'static,
    G: PaymentGateway + 'static,
{
    Arc::new(AppState { coordinator })
}

/// Creates default application state with the in-memory journal and
/// gateway, for local runs and tests.
pub fn create_default_state() -> Arc<AppState<InMemoryJournal, InMemoryPaymentGateway>> {
    let journal = InMemoryJournal::new();
    let gateway = InMemoryPaymentGateway::new();
    create_state(Arc::new(SagaCoordinator::new(journal, gateway)))
}
