//! Saga error types.

use common::PaymentId;
use gateway::GatewayError;
use journal::JournalError;
use thiserror::Error;

use crate::state::SagaState;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A saga for this payment has already been started.
    #[error("Saga already started for payment {0}")]
    AlreadyStarted(PaymentId),

    /// No saga exists for this payment.
    #[error("Saga not found for payment {0}")]
    NotFound(PaymentId),

    /// The saga is in an invalid state for the requested operation.
    #[error("Saga for payment {payment_id} is in state {state}")]
    InvalidState {
        payment_id: PaymentId,
        state: SagaState,
    },

    /// Submitting the reservation request failed.
    #[error("Reservation request failed: {0}")]
    Reservation(#[source] GatewayError),

    /// Emitting the terminal publication failed.
    #[error("Publication failed: {0}")]
    Publication(#[source] GatewayError),

    /// The saga's cancellation scope was cancelled mid-step.
    #[error("Saga cancelled")]
    Cancelled,

    /// Journal error.
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
