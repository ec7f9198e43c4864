//! Transition journal for payment sagas.
//!
//! This crate captures the contract the saga core expects from its durable
//! execution substrate: every state transition is appended as a record, and
//! a saga can be rebuilt deterministically by replaying its records in
//! sequence order. The [`InMemoryJournal`] realization backs tests and the
//! default server wiring; a durable backend would implement the same trait.

pub mod error;
pub mod memory;
pub mod record;
pub mod store;

pub use common::PaymentId;
pub use error::{JournalError, Result};
pub use memory::InMemoryJournal;
pub use record::{RecordId, Seq, TransitionRecord, TransitionRecordBuilder};
pub use store::{SagaJournal, SagaJournalExt};
