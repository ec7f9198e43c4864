//! Payment data model shared across crates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::PaymentId;

/// A request to process a payment. Immutable once a saga starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub payment_id: PaymentId,
    pub amount: Decimal,
    pub currency: String,
    pub debtor_account: String,
    pub creditor_account: String,
}

/// The counterparty's answer to a funds reservation, delivered
/// asynchronously via callback.
///
/// Produced exactly once per saga by the counterparty; later duplicates
/// are dropped by the signal mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationOutcome {
    pub success: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ReservationOutcome {
    /// A positive reservation outcome.
    pub fn confirmed() -> Self {
        Self {
            success: true,
            reason: None,
        }
    }

    /// A negative reservation outcome with the counterparty's reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
        }
    }
}

/// Result of the synchronous transfer call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    // "continue" means success; anything else is a business rejection
    pub status: String,
}

impl TransferOutcome {
    /// The status token denoting a successful transfer.
    pub const CONTINUE: &'static str = "continue";

    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }

    /// Returns true if the transfer succeeded.
    pub fn is_continue(&self) -> bool {
        self.status == Self::CONTINUE
    }
}

/// Terminal status of a payment saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Failed,
    Rejected,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Rejected => "REJECTED",
        };
        write!(f, "{s}")
    }
}

/// The saga's sole externally observable terminal artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentResult {
    /// A COMPLETED result. Carries no message.
    pub fn completed(payment_id: PaymentId) -> Self {
        Self {
            payment_id,
            status: PaymentStatus::Completed,
            message: None,
        }
    }

    /// A FAILED result with a human-readable message.
    pub fn failed(payment_id: PaymentId, message: impl Into<String>) -> Self {
        Self {
            payment_id,
            status: PaymentStatus::Failed,
            message: Some(message.into()),
        }
    }

    /// A REJECTED result with a human-readable message.
    pub fn rejected(payment_id: PaymentId, message: impl Into<String>) -> Self {
        Self {
            payment_id,
            status: PaymentStatus::Rejected,
            message: Some(message.into()),
        }
    }
}
