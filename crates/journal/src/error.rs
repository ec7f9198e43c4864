use thiserror::Error;

use common::PaymentId;

use crate::Seq;

/// Errors that can occur when interacting with the transition journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// A concurrency conflict occurred when appending records.
    /// The expected sequence number did not match the actual one.
    #[error(
        "Sequence conflict for payment {payment_id}: expected sequence {expected}, found {actual}"
    )]
    SequenceConflict {
        payment_id: PaymentId,
        expected: Seq,
        actual: Seq,
    },

    /// The append batch was rejected before reaching storage.
    #[error("Invalid append batch: {0}")]
    InvalidBatch(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for journal operations.
pub type Result<T> = std::result::Result<T, JournalError>;
