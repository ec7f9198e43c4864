//! Saga transition events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{PaymentId, PaymentRequest};

/// Events that can occur during a payment saga.
///
/// Each event is one journaled checkpoint; replaying them in order
/// rebuilds the saga deterministically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// Saga execution started for a payment request.
    SagaStarted(SagaStartedData),

    /// The reservation request was submitted to the counterparty.
    ReservationRequested(ReservationRequestedData),

    /// A positive reservation outcome arrived.
    ReservationConfirmed(ReservationConfirmedData),

    /// A negative reservation outcome arrived.
    ReservationRejected(ReasonData),

    /// The inner signal wait elapsed without an outcome.
    ReservationTimedOut(ReservationTimedOutData),

    /// The transfer call returned a status token.
    TransferExecuted(TransferExecutedData),

    /// The transfer failed non-retryably (client error or retries
    /// exhausted).
    TransferFailed(ReasonData),

    /// The overall saga deadline fired and the sequence was abandoned.
    OverallTimeoutReached(OverallTimeoutData),

    /// The terminal publication (completed or rejected) was emitted.
    PublicationEmitted(PublicationEmittedData),
}

impl SagaEvent {
    /// Returns the event type name used in journal records.
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::SagaStarted(_) => "SagaStarted",
            SagaEvent::ReservationRequested(_) => "ReservationRequested",
            SagaEvent::ReservationConfirmed(_) => "ReservationConfirmed",
            SagaEvent::ReservationRejected(_) => "ReservationRejected",
            SagaEvent::ReservationTimedOut(_) => "ReservationTimedOut",
            SagaEvent::TransferExecuted(_) => "TransferExecuted",
            SagaEvent::TransferFailed(_) => "TransferFailed",
            SagaEvent::OverallTimeoutReached(_) => "OverallTimeoutReached",
            SagaEvent::PublicationEmitted(_) => "PublicationEmitted",
        }
    }
}

/// Data for SagaStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaStartedData {
    /// The payment being processed.
    pub payment_id: PaymentId,
    /// The immutable payment request.
    pub request: PaymentRequest,
    /// The saga type (e.g. "PaymentProcessing").
    pub saga_type: String,
    /// When the saga started.
    pub started_at: DateTime<Utc>,
}

/// Data for ReservationRequested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRequestedData {
    /// When the request was accepted by the counterparty.
    pub requested_at: DateTime<Utc>,
}

/// Data for ReservationConfirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfirmedData {
    /// When the confirmation was observed.
    pub confirmed_at: DateTime<Utc>,
}

/// Data for events that carry a failure or rejection reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonData {
    /// Human-readable reason.
    pub reason: String,
}

/// Data for ReservationTimedOut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationTimedOutData {
    /// How long the saga waited, in seconds.
    pub waited_secs: u64,
}

/// Data for TransferExecuted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferExecutedData {
    /// The status token returned by the transfer call.
    pub status: String,
}

/// Data for OverallTimeoutReached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallTimeoutData {
    /// When the deadline fired.
    pub aborted_at: DateTime<Utc>,
}

/// Which terminal publication was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationKind {
    Completed,
    Rejected,
}

/// Data for PublicationEmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationEmittedData {
    /// Which publication was emitted.
    pub kind: PublicationKind,
    /// Reason carried by a rejection publication.
    pub reason: Option<String>,
}

// Convenience constructors
impl SagaEvent {
    /// Creates a SagaStarted event.
    pub fn saga_started(request: PaymentRequest, saga_type: impl Into<String>) -> Self {
        SagaEvent::SagaStarted(SagaStartedData {
            payment_id: request.payment_id.clone(),
            request,
            saga_type: saga_type.into(),
            started_at: Utc::now(),
        })
    }

    /// Creates a ReservationRequested event.
    pub fn reservation_requested() -> Self {
        SagaEvent::ReservationRequested(ReservationRequestedData {
            requested_at: Utc::now(),
        })
    }

    /// Creates a ReservationConfirmed event.
    pub fn reservation_confirmed() -> Self {
        SagaEvent::ReservationConfirmed(ReservationConfirmedData {
            confirmed_at: Utc::now(),
        })
    }

    /// Creates a ReservationRejected event.
    pub fn reservation_rejected(reason: impl Into<String>) -> Self {
        SagaEvent::ReservationRejected(ReasonData {
            reason: reason.into(),
        })
    }

    /// Creates a ReservationTimedOut event.
    pub fn reservation_timed_out(waited_secs: u64) -> Self {
        SagaEvent::ReservationTimedOut(ReservationTimedOutData { waited_secs })
    }

    /// Creates a TransferExecuted event.
    pub fn transfer_executed(status: impl Into<String>) -> Self {
        SagaEvent::TransferExecuted(TransferExecutedData {
            status: status.into(),
        })
    }

    /// Creates a TransferFailed event.
    pub fn transfer_failed(reason: impl Into<String>) -> Self {
        SagaEvent::TransferFailed(ReasonData {
            reason: reason.into(),
        })
    }

    /// Creates an OverallTimeoutReached event.
    pub fn overall_timeout_reached() -> Self {
        SagaEvent::OverallTimeoutReached(OverallTimeoutData {
            aborted_at: Utc::now(),
        })
    }

    /// Creates a PublicationEmitted event.
    pub fn publication_emitted(kind: PublicationKind, reason: Option<String>) -> Self {
        SagaEvent::PublicationEmitted(PublicationEmittedData { kind, reason })
    }
}
