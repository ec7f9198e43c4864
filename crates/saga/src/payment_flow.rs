//! Payment saga constants.

use common::PaymentId;

/// The saga type identifier for payment processing.
pub const SAGA_TYPE: &str = "PaymentProcessing";

/// Prefix for externally visible saga identifiers.
pub const SAGA_ID_PREFIX: &str = "payment-saga-";

/// Reason used when the inner signal wait elapses.
pub const REASON_RESERVATION_TIMED_OUT: &str = "Reservation timed out";

/// Default reason for a negative reservation outcome without one.
pub const REASON_RESERVATION_REJECTED: &str = "Reservation rejected";

/// Reason used when the outer saga deadline fires.
pub const REASON_OVERALL_TIMEOUT: &str = "Overall timeout reached";

/// Returns the externally visible saga identifier for a payment.
pub fn saga_id(payment_id: &PaymentId) -> String {
    format!("{SAGA_ID_PREFIX}{payment_id}")
}

/// Returns the failure reason for a transfer rejected with the given
/// status token.
pub fn transfer_failed_reason(status: &str) -> String {
    format!("Transfer failed: {status}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saga_id_carries_prefix() {
        assert_eq!(
            saga_id(&PaymentId::new("PAY-1")),
            "payment-saga-PAY-1".to_string()
        );
    }

    #[test]
    fn transfer_failed_reason_includes_status() {
        assert_eq!(
            transfer_failed_reason("pending-review"),
            "Transfer failed: pending-review"
        );
    }
}
