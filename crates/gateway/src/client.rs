//! The gateway trait consumed by the saga orchestrator.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use common::{PaymentId, TransferOutcome};

use crate::GatewayError;

/// Outbound calls to the counterparty payment API.
///
/// `submit_reservation` and the two publish operations are fire-and-forget
/// from the orchestrator's viewpoint: their completion means "accepted for
/// processing", not settlement. `execute_transfer` is synchronous and
/// performs bounded retries on transient failure internally; the caller
/// only observes an outcome, a non-retryable error, or `Cancelled`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Synchronous fraud screening. Available to the business layer; the
    /// core saga sequence does not call it.
    async fn fraud_check(&self, payment_id: &PaymentId) -> Result<(), GatewayError>;

    /// Sends the reservation request and returns once it is accepted.
    /// The outcome arrives later as a signal.
    async fn submit_reservation(&self, payment_id: &PaymentId) -> Result<(), GatewayError>;

    /// Executes the funds transfer, retrying 5xx/transport failures per the
    /// gateway's retry policy. Backoff is preempted by `cancel`.
    async fn execute_transfer(
        &self,
        payment_id: &PaymentId,
        cancel: &CancellationToken,
    ) -> Result<TransferOutcome, GatewayError>;

    /// Publishes the payment-completed event.
    async fn publish_completed(&self, payment_id: &PaymentId) -> Result<(), GatewayError>;

    /// Publishes the payment-rejected event with a reason.
    async fn publish_rejected(
        &self,
        payment_id: &PaymentId,
        reason: &str,
    ) -> Result<(), GatewayError>;
}
