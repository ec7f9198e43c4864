//! Saga instance rebuilt from journaled transitions.

use serde::{Deserialize, Serialize};

use common::{PaymentId, PaymentRequest, PaymentResult, TransferOutcome};
use journal::Seq;

use crate::events::SagaEvent;
use crate::payment_flow;
use crate::state::SagaState;

/// The replayable state of one payment saga.
///
/// `apply` is pure and deterministic: given the same events in the same
/// order it always produces the same instance. Effect flags
/// (`reservation_requested`, `transfer_status`, `publication_emitted`)
/// let a resumed saga skip externally visible effects it already
/// performed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SagaInstance {
    payment_id: Option<PaymentId>,
    request: Option<PaymentRequest>,
    seq: Seq,
    state: SagaState,
    reservation_requested: bool,
    transfer_status: Option<String>,
    failure_reason: Option<String>,
    publication_emitted: bool,
}

impl SagaInstance {
    /// Applies an event, updating the instance state.
    pub fn apply(&mut self, event: SagaEvent) {
        match event {
            SagaEvent::SagaStarted(data) => {
                self.payment_id = Some(data.payment_id);
                self.request = Some(data.request);
                self.state = SagaState::Reserving;
            }
            SagaEvent::ReservationRequested(_) => {
                self.reservation_requested = true;
                self.state = SagaState::AwaitingConfirmation;
            }
            SagaEvent::ReservationConfirmed(_) => {
                self.state = SagaState::Transferring;
            }
            SagaEvent::ReservationRejected(data) => {
                self.failure_reason = Some(data.reason);
                self.state = SagaState::RejectedByCounterparty;
            }
            SagaEvent::ReservationTimedOut(_) => {
                self.failure_reason =
                    Some(payment_flow::REASON_RESERVATION_TIMED_OUT.to_string());
                self.state = SagaState::RejectedNoSignal;
            }
            SagaEvent::TransferExecuted(data) => {
                if data.status == TransferOutcome::CONTINUE {
                    self.state = SagaState::Completed;
                } else {
                    self.failure_reason =
                        Some(payment_flow::transfer_failed_reason(&data.status));
                    self.state = SagaState::Failed;
                }
                self.transfer_status = Some(data.status);
            }
            SagaEvent::TransferFailed(data) => {
                self.failure_reason = Some(data.reason);
                self.state = SagaState::Failed;
            }
            SagaEvent::OverallTimeoutReached(_) => {
                self.failure_reason = Some(payment_flow::REASON_OVERALL_TIMEOUT.to_string());
                self.state = SagaState::Aborted;
            }
            SagaEvent::PublicationEmitted(_) => {
                self.publication_emitted = true;
            }
        }
    }

    /// Applies multiple events in sequence.
    pub fn apply_events(&mut self, events: impl IntoIterator<Item = SagaEvent>) {
        for event in events {
            self.apply(event);
        }
    }
}

// Query methods
impl SagaInstance {
    /// Returns the payment ID, or None for an uninitialized instance.
    pub fn payment_id(&self) -> Option<&PaymentId> {
        self.payment_id.as_ref()
    }

    /// Returns the payment request.
    pub fn request(&self) -> Option<&PaymentRequest> {
        self.request.as_ref()
    }

    /// Returns the journal sequence of the last applied transition.
    pub fn seq(&self) -> Seq {
        self.seq
    }

    /// Sets the journal sequence after appending a record.
    pub fn set_seq(&mut self, seq: Seq) {
        self.seq = seq;
    }

    /// Returns the current state.
    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Returns true if the reservation request was already submitted.
    pub fn reservation_requested(&self) -> bool {
        self.reservation_requested
    }

    /// Returns the transfer status token, if the transfer already ran.
    pub fn transfer_status(&self) -> Option<&str> {
        self.transfer_status.as_deref()
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns true if the terminal publication was already emitted.
    pub fn publication_emitted(&self) -> bool {
        self.publication_emitted
    }

    /// Returns the terminal payment result, or None while the saga is
    /// still in flight.
    ///
    /// This is a pure function of the replayed state, so a rebuilt saga
    /// always reproduces the same result.
    pub fn result(&self) -> Option<PaymentResult> {
        let payment_id = self.payment_id.clone()?;
        match self.state {
            SagaState::Completed => Some(PaymentResult::completed(payment_id)),
            SagaState::Failed | SagaState::RejectedByCounterparty => Some(PaymentResult::failed(
                payment_id,
                self.failure_reason
                    .clone()
                    .unwrap_or_else(|| payment_flow::REASON_RESERVATION_REJECTED.to_string()),
            )),
            SagaState::RejectedNoSignal => Some(PaymentResult::rejected(
                payment_id,
                payment_flow::REASON_RESERVATION_TIMED_OUT,
            )),
            SagaState::Aborted => Some(PaymentResult::rejected(
                payment_id,
                payment_flow::REASON_OVERALL_TIMEOUT,
            )),
            _ => None,
        }
    }
}
