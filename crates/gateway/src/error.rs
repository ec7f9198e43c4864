//! Gateway error classification.

use thiserror::Error;

use common::PaymentId;

/// Errors reported by the activity gateway.
///
/// The classification drives the orchestrator's decisions: client errors
/// are fatal for the current step, server and transport errors are retried
/// inside the gateway, and cancellation is a control signal that must never
/// be retried.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A response in the client-error range (400-499). Non-retryable.
    #[error("Counterparty client error {status} for payment {payment_id}")]
    Client { status: u16, payment_id: PaymentId },

    /// A response in the server-error range (500-599). Retryable.
    #[error("Counterparty server error {status}")]
    Server { status: u16 },

    /// A transport-level failure (connection refused, timeout, bad body).
    /// Retryable.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The bounded retry policy gave up. Carries the last retryable error.
    #[error("Retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<GatewayError>,
    },

    /// The call was preempted by saga cancellation. Never retried.
    #[error("Call cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Returns true if the retry policy may re-attempt after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Server { .. } | GatewayError::Transport(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}
