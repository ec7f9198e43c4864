use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::PaymentId;

/// Unique identifier for a journal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random record ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequence number of a transition within one saga, used for optimistic
/// concurrency control.
///
/// Sequences start at 1 for the first record and increment by 1 for each
/// subsequent record of the same saga.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Seq(u64);

impl Seq {
    /// Creates a sequence number from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the initial sequence (0) for a saga with no records.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the sequence (1) of the first record.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next sequence number.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Seq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A journaled state transition with its metadata.
///
/// Wraps a saga event with everything needed to persist, correlate and
/// replay it: the saga's payment identifier, the per-saga sequence number
/// and the event payload as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Unique identifier for this record.
    pub record_id: RecordId,

    /// The type of the transition (e.g. "ReservationConfirmed").
    pub event_type: String,

    /// The saga this record belongs to.
    pub payment_id: PaymentId,

    /// The saga's sequence number after this transition.
    pub seq: Seq,

    /// When the record was created.
    pub timestamp: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,
}

impl TransitionRecord {
    /// Creates a new transition record builder.
    pub fn builder() -> TransitionRecordBuilder {
        TransitionRecordBuilder::default()
    }
}

/// Builder for constructing transition records.
#[derive(Debug, Default)]
pub struct TransitionRecordBuilder {
    record_id: Option<RecordId>,
    event_type: Option<String>,
    payment_id: Option<PaymentId>,
    seq: Option<Seq>,
    timestamp: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
}

impl TransitionRecordBuilder {
    /// Sets the record ID. If not set, a new ID is generated.
    pub fn record_id(mut self, id: RecordId) -> Self {
        self.record_id = Some(id);
        self
    }

    /// Sets the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the payment ID.
    pub fn payment_id(mut self, id: PaymentId) -> Self {
        self.payment_id = Some(id);
        self
    }

    /// Sets the sequence number.
    pub fn seq(mut self, seq: Seq) -> Self {
        self.seq = Some(seq);
        self
    }

    /// Sets the timestamp. If not set, the current time is used.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: serde::Serialize>(
        mut self,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Builds the transition record.
    ///
    /// # Panics
    ///
    /// Panics if required fields (event_type, payment_id, seq, payload)
    /// are not set.
    pub fn build(self) -> TransitionRecord {
        TransitionRecord {
            record_id: self.record_id.unwrap_or_default(),
            event_type: self.event_type.expect("event_type is required"),
            payment_id: self.payment_id.expect("payment_id is required"),
            seq: self.seq.expect("seq is required"),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            payload: self.payload.expect("payload is required"),
        }
    }
}
