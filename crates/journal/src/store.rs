use async_trait::async_trait;

use common::PaymentId;

use crate::{JournalError, Result, Seq, TransitionRecord};

/// Core trait for saga journal implementations.
///
/// A journal persists the state transitions of every saga so that execution
/// can be resumed from the last committed transition. All implementations
/// must be thread-safe (Send + Sync).
#[async_trait]
pub trait SagaJournal: Send + Sync {
    /// Appends records for a single saga atomically.
    ///
    /// If `expected_seq` is set, the operation fails with
    /// [`JournalError::SequenceConflict`] when the saga's current sequence
    /// does not match. Passing `Some(Seq::initial())` therefore rejects a
    /// second start of the same saga.
    ///
    /// Returns the saga's sequence after appending.
    async fn append(
        &self,
        records: Vec<TransitionRecord>,
        expected_seq: Option<Seq>,
    ) -> Result<Seq>;

    /// Retrieves all records for a saga in sequence order (oldest first).
    async fn records_for(&self, payment_id: &PaymentId) -> Result<Vec<TransitionRecord>>;

    /// Returns the current sequence of a saga, or None if it has no records.
    async fn current_seq(&self, payment_id: &PaymentId) -> Result<Option<Seq>>;
}

/// Extension trait providing convenience methods for journals.
#[async_trait]
pub trait SagaJournalExt: SagaJournal {
    /// Appends a single record.
    async fn append_record(
        &self,
        record: TransitionRecord,
        expected_seq: Option<Seq>,
    ) -> Result<Seq> {
        self.append(vec![record], expected_seq).await
    }

    /// Checks whether a saga exists (has any records).
    async fn saga_exists(&self, payment_id: &PaymentId) -> Result<bool> {
        Ok(self.current_seq(payment_id).await?.is_some())
    }
}

// Blanket implementation for all SagaJournal implementations
impl<T: SagaJournal + ?Sized> SagaJournalExt for T {}

/// Validates a batch of records before appending.
///
/// All records must belong to the same saga and carry sequential
/// sequence numbers.
pub fn validate_records_for_append(records: &[TransitionRecord]) -> Result<()> {
    let first = records
        .first()
        .ok_or_else(|| JournalError::InvalidBatch("Cannot append empty record batch".into()))?;

    for record in records.iter().skip(1) {
        if record.payment_id != first.payment_id {
            return Err(JournalError::InvalidBatch(
                "All records must belong to the same saga".into(),
            ));
        }
    }

    let mut expected = first.seq;
    for record in records.iter().skip(1) {
        expected = expected.next();
        if record.seq != expected {
            return Err(JournalError::InvalidBatch(format!(
                "Record sequences must be sequential. Expected {}, got {}",
                expected, record.seq
            )));
        }
    }

    Ok(())
}
