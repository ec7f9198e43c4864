use serde::{Deserialize, Serialize};

/// Unique identifier for a payment, supplied by the caller.
///
/// Wraps a string to provide type safety and prevent mixing up
/// payment identifiers with other string-based values. One saga
/// runs per payment identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    /// Creates a payment ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PaymentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for PaymentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<PaymentId> for String {
    fn from(id: PaymentId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_id_preserves_value() {
        let id = PaymentId::new("PAY-2024-001");
        assert_eq!(id.as_str(), "PAY-2024-001");
        assert_eq!(id.to_string(), "PAY-2024-001");
    }

    #[test]
    fn payment_id_equality() {
        assert_eq!(PaymentId::from("a"), PaymentId::new("a"));
        assert_ne!(PaymentId::from("a"), PaymentId::from("b"));
    }

    #[test]
    fn payment_id_serialization_is_transparent() {
        let id = PaymentId::new("PAY-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"PAY-42\"");
        let deserialized: PaymentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
