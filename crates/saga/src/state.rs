//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of a payment saga in its lifecycle.
///
/// State transitions:
/// ```text
/// NotStarted ──► Reserving ──► AwaitingConfirmation ──┬──► Transferring ──┬──► Completed
///                                                     ├──► RejectedNoSignal └──► Failed
///                                                     └──► RejectedByCounterparty
/// ```
/// `Aborted` is reachable from any non-terminal state when the overall
/// saga deadline fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Saga has not started yet.
    #[default]
    NotStarted,

    /// Submitting the funds reservation request.
    Reserving,

    /// Suspended, waiting for the counterparty's reservation outcome.
    AwaitingConfirmation,

    /// Executing the synchronous funds transfer.
    Transferring,

    /// The inner signal wait elapsed without a confirmation (terminal).
    RejectedNoSignal,

    /// The counterparty rejected the reservation (terminal).
    RejectedByCounterparty,

    /// Transfer executed and accepted (terminal).
    Completed,

    /// Transfer rejected or failed non-retryably (terminal).
    Failed,

    /// The overall saga deadline fired and the sequence was abandoned
    /// (terminal).
    Aborted,
}

impl SagaState {
    /// Returns true if the saga may still make progress.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SagaState::Reserving | SagaState::AwaitingConfirmation | SagaState::Transferring
        )
    }

    /// Returns true if this state produces a payment result.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::RejectedNoSignal
                | SagaState::RejectedByCounterparty
                | SagaState::Completed
                | SagaState::Failed
                | SagaState::Aborted
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "NotStarted",
            SagaState::Reserving => "Reserving",
            SagaState::AwaitingConfirmation => "AwaitingConfirmation",
            SagaState::Transferring => "Transferring",
            SagaState::RejectedNoSignal => "RejectedNoSignal",
            SagaState::RejectedByCounterparty => "RejectedByCounterparty",
            SagaState::Completed => "Completed",
            SagaState::Failed => "Failed",
            SagaState::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_not_started() {
        assert_eq!(SagaState::default(), SagaState::NotStarted);
    }

    #[test]
    fn active_states() {
        assert!(SagaState::Reserving.is_active());
        assert!(SagaState::AwaitingConfirmation.is_active());
        assert!(SagaState::Transferring.is_active());
        assert!(!SagaState::NotStarted.is_active());
        assert!(!SagaState::Completed.is_active());
        assert!(!SagaState::Aborted.is_active());
    }

    #[test]
    fn terminal_states() {
        assert!(SagaState::RejectedNoSignal.is_terminal());
        assert!(SagaState::RejectedByCounterparty.is_terminal());
        assert!(SagaState::Completed.is_terminal());
        assert!(SagaState::Failed.is_terminal());
        assert!(SagaState::Aborted.is_terminal());
        assert!(!SagaState::NotStarted.is_terminal());
        assert!(!SagaState::AwaitingConfirmation.is_terminal());
    }

    #[test]
    fn display() {
        assert_eq!(
            SagaState::AwaitingConfirmation.to_string(),
            "AwaitingConfirmation"
        );
        assert_eq!(SagaState::RejectedNoSignal.to_string(), "RejectedNoSignal");
    }

    #[test]
    fn serialization_roundtrip() {
        let state = SagaState::Transferring;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: SagaState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
