//! Saga orchestration for payment processing.
//!
//! This crate drives a single saga shape:
//! 1. Reserve funds with the counterparty (fire and forget)
//! 2. Await the asynchronous reservation confirmation
//! 3. Execute the synchronous funds transfer
//! 4. Publish the terminal outcome
//!
//! Two deadlines bound the saga: an inner wait on the confirmation signal
//! and an outer deadline over the whole sequence. When the outer deadline
//! fires, the step sequence is cancelled cooperatively and a detached
//! cleanup path still publishes the rejection. Every transition is
//! journaled so a saga can be rebuilt deterministically from its records.

pub mod coordinator;
pub mod error;
pub mod events;
pub mod instance;
pub mod mailbox;
pub mod payment_flow;
pub mod scope;
pub mod state;

pub use coordinator::{SagaConfig, SagaCoordinator};
pub use error::SagaError;
pub use events::SagaEvent;
pub use instance::SagaInstance;
pub use mailbox::{Delivery, ReservationMailbox, SignalRegistry, SignalWait};
pub use scope::{CancellableScope, ScopeOutcome};
pub use state::SagaState;
