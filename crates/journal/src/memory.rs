use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::PaymentId;

use crate::store::{SagaJournal, validate_records_for_append};
use crate::{JournalError, Result, Seq, TransitionRecord};

/// In-memory journal implementation.
///
/// Stores all records in memory behind an async lock. Backs tests and the
/// default server wiring; a durable substrate would provide the same
/// interface over persistent storage.
#[derive(Clone, Default)]
pub struct InMemoryJournal {
    records: Arc<RwLock<Vec<TransitionRecord>>>,
}

impl InMemoryJournal {
    /// Creates a new empty in-memory journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored across all sagas.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl SagaJournal for InMemoryJournal {
    async fn append(
        &self,
        records: Vec<TransitionRecord>,
        expected_seq: Option<Seq>,
    ) -> Result<Seq> {
        validate_records_for_append(&records)?;

        let payment_id = records[0].payment_id.clone();
        let mut store = self.records.write().await;

        let current = store
            .iter()
            .filter(|r| r.payment_id == payment_id)
            .map(|r| r.seq)
            .max()
            .unwrap_or(Seq::initial());

        if let Some(expected) = expected_seq
            && current != expected
        {
            return Err(JournalError::SequenceConflict {
                payment_id,
                expected,
                actual: current,
            });
        }

        // Unique-sequence simulation: the first new record must follow the
        // current sequence even without an explicit expectation.
        if records[0].seq <= current && current != Seq::initial() {
            return Err(JournalError::SequenceConflict {
                payment_id,
                expected: expected_seq.unwrap_or(current),
                actual: current,
            });
        }

        let last = records.last().map(|r| r.seq).unwrap_or(Seq::initial());
        store.extend(records);
        Ok(last)
    }

    async fn records_for(&self, payment_id: &PaymentId) -> Result<Vec<TransitionRecord>> {
        let store = self.records.read().await;
        let mut records: Vec<_> = store
            .iter()
            .filter(|r| r.payment_id == *payment_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.seq);
        Ok(records)
    }

    async fn current_seq(&self, payment_id: &PaymentId) -> Result<Option<Seq>> {
        let store = self.records.read().await;
        Ok(store
            .iter()
            .filter(|r| r.payment_id == *payment_id)
            .map(|r| r.seq)
            .max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SagaJournalExt;

    fn record(id: &str, event_type: &str, seq: u64) -> TransitionRecord {
        TransitionRecord::builder()
            .event_type(event_type)
            .payment_id(PaymentId::new(id))
            .seq(Seq::new(seq))
            .payload(&serde_json::json!({}))
            .unwrap()
            .build()
    }

    #[tokio::test]
    async fn append_and_read_back() {
        let journal = InMemoryJournal::new();
        let id = PaymentId::new("PAY-1");

        journal
            .append_record(record("PAY-1", "SagaStarted", 1), Some(Seq::initial()))
            .await
            .unwrap();
        journal
            .append_record(record("PAY-1", "ReservationRequested", 2), Some(Seq::first()))
            .await
            .unwrap();

        let records = journal.records_for(&id).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_type, "SagaStarted");
        assert_eq!(records[1].event_type, "ReservationRequested");
        assert_eq!(journal.current_seq(&id).await.unwrap(), Some(Seq::new(2)));
    }

    #[tokio::test]
    async fn expect_new_rejects_second_start() {
        let journal = InMemoryJournal::new();

        journal
            .append_record(record("PAY-1", "SagaStarted", 1), Some(Seq::initial()))
            .await
            .unwrap();

        let err = journal
            .append_record(record("PAY-1", "SagaStarted", 1), Some(Seq::initial()))
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::SequenceConflict { .. }));
    }

    #[tokio::test]
    async fn stale_sequence_is_rejected() {
        let journal = InMemoryJournal::new();

        journal
            .append_record(record("PAY-1", "SagaStarted", 1), None)
            .await
            .unwrap();
        journal
            .append_record(record("PAY-1", "ReservationRequested", 2), None)
            .await
            .unwrap();

        // Re-appending sequence 2 must conflict even without an expectation
        let err = journal
            .append_record(record("PAY-1", "ReservationConfirmed", 2), None)
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::SequenceConflict { .. }));
    }

    #[tokio::test]
    async fn sagas_are_isolated() {
        let journal = InMemoryJournal::new();

        journal
            .append_record(record("PAY-1", "SagaStarted", 1), Some(Seq::initial()))
            .await
            .unwrap();
        journal
            .append_record(record("PAY-2", "SagaStarted", 1), Some(Seq::initial()))
            .await
            .unwrap();

        assert_eq!(journal.record_count().await, 2);
        let records = journal.records_for(&PaymentId::new("PAY-2")).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn unknown_saga_has_no_seq() {
        let journal = InMemoryJournal::new();
        assert!(!journal.saga_exists(&PaymentId::new("nope")).await.unwrap());
        assert_eq!(
            journal.current_seq(&PaymentId::new("nope")).await.unwrap(),
            None
        );
    }
}
