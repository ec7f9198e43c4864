//! Shared data model for the payment saga.
//!
//! Defines the identifier newtype and the request/outcome/result types
//! exchanged between the API surface, the gateway and the orchestrator.

pub mod model;
pub mod types;

pub use model::{
    PaymentRequest, PaymentResult, PaymentStatus, ReservationOutcome, TransferOutcome,
};
pub use types::PaymentId;
