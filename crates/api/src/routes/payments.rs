//! Payment saga endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{PaymentId, PaymentRequest, ReservationOutcome};
use gateway::PaymentGateway;
use journal::SagaJournal;
use saga::{Delivery, SagaCoordinator};
use serde::Serialize;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<J: SagaJournal, G: PaymentGateway> {
    pub coordinator: Arc<SagaCoordinator<J, G>>,
}

// -- Response types --

#[derive(Serialize)]
pub struct PaymentAcceptedResponse {
    pub saga_id: String,
}

#[derive(Serialize)]
pub struct SignalAckResponse {
    /// True if the outcome reached a waiting saga; false for late or
    /// duplicate deliveries (still acknowledged with 200).
    pub signaled: bool,
}

#[derive(Serialize)]
pub struct PaymentStatusResponse {
    pub payment_id: String,
    pub state: String,
    /// Terminal status, present once the publication was emitted.
    pub status: Option<String>,
    pub message: Option<String>,
}

// -- Handlers --

/// POST /payments — accept a payment request and start its saga.
///
/// Responds immediately with 202 and the saga ID; the caller never
/// blocks on saga completion here.
#[tracing::instrument(skip(state, request), fields(payment_id = %request.payment_id))]
pub async fn create<J, G>(
    State(state): State<Arc<AppState<J, G>>>,
    Json(request): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentAcceptedResponse>), ApiError>
where
    J: SagaJournal + 'static,
    G: PaymentGateway + 'static,
{
    if request.payment_id.as_str().is_empty() {
        return Err(ApiError::BadRequest("payment_id must not be empty".into()));
    }

    let saga_id = state.coordinator.start(request).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(PaymentAcceptedResponse { saga_id }),
    ))
}

/// POST /payments/{id}/reservation-result — forward a reservation
/// outcome callback to the matching saga.
#[tracing::instrument(skip(state, outcome))]
pub async fn reservation_result<J, G>(
    State(state): State<Arc<AppState<J, G>>>,
    Path(id): Path<String>,
    Json(outcome): Json<ReservationOutcome>,
) -> Result<Json<SignalAckResponse>, ApiError>
where
    J: SagaJournal + 'static,
    G: PaymentGateway + 'static,
{
    let payment_id = PaymentId::new(id);
    let delivery = state.coordinator.deliver(&payment_id, outcome).await;
    Ok(Json(SignalAckResponse {
        signaled: delivery == Delivery::Recorded,
    }))
}

/// GET /payments/{id} — current state and result of a payment saga.
#[tracing::instrument(skip(state))]
pub async fn get<J, G>(
    State(state): State<Arc<AppState<J, G>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentStatusResponse>, ApiError>
where
    J: SagaJournal + 'static,
    G: PaymentGateway + 'static,
{
    let payment_id = PaymentId::new(id);
    let instance = state
        .coordinator
        .load(&payment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Payment {payment_id} not found")))?;

    let result = instance
        .publication_emitted()
        .then(|| instance.result())
        .flatten();

    Ok(Json(PaymentStatusResponse {
        payment_id: payment_id.to_string(),
        state: instance.state().to_string(),
        status: result.as_ref().map(|r| r.status.to_string()),
        message: result.and_then(|r| r.message),
    }))
}
