//! Signal correlation between the HTTP surface and waiting sagas.
//!
//! Each in-flight saga registers a write-once mailbox keyed by payment
//! ID. A reservation result delivered before the saga starts waiting is
//! retained, so the waiter observes it immediately instead of blocking
//! until the deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};

use common::{PaymentId, ReservationOutcome};

/// Outcome of delivering a reservation result to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The result was recorded and the waiter (if any) will observe it.
    Recorded,
    /// A result for this payment was already recorded; the new one is
    /// discarded.
    Duplicate,
    /// No saga is registered under this payment ID.
    Unmatched,
}

/// Result of waiting on a mailbox.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalWait {
    Received(ReservationOutcome),
    TimedOut,
}

struct Mailbox {
    tx: watch::Sender<Option<ReservationOutcome>>,
}

/// Registry of per-payment reservation mailboxes.
#[derive(Clone, Default)]
pub struct SignalRegistry {
    mailboxes: Arc<RwLock<HashMap<PaymentId, Mailbox>>>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mailbox for a payment and returns its receiver.
    ///
    /// Registering twice for the same payment returns a receiver for
    /// the existing mailbox, so a delivery made before the second
    /// registration is not lost.
    pub async fn register(&self, payment_id: &PaymentId) -> ReservationMailbox {
        let mut mailboxes = self.mailboxes.write().await;
        let mailbox = mailboxes
            .entry(payment_id.clone())
            .or_insert_with(|| Mailbox {
                tx: watch::Sender::new(None),
            });
        ReservationMailbox {
            rx: mailbox.tx.subscribe(),
        }
    }

    /// Delivers a reservation result to the mailbox for a payment.
    ///
    /// Only the first delivery per payment is recorded.
    pub async fn deliver(&self, payment_id: &PaymentId, outcome: ReservationOutcome) -> Delivery {
        let mailboxes = self.mailboxes.read().await;
        let Some(mailbox) = mailboxes.get(payment_id) else {
            return Delivery::Unmatched;
        };
        let mut recorded = false;
        mailbox.tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(outcome.clone());
                recorded = true;
                true
            } else {
                false
            }
        });
        if recorded {
            Delivery::Recorded
        } else {
            Delivery::Duplicate
        }
    }

    /// Removes the mailbox for a payment once its saga leaves the wait.
    pub async fn unregister(&self, payment_id: &PaymentId) {
        self.mailboxes.write().await.remove(payment_id);
    }

    /// Returns true if a mailbox is registered for this payment.
    pub async fn is_registered(&self, payment_id: &PaymentId) -> bool {
        self.mailboxes.read().await.contains_key(payment_id)
    }
}

/// Receiving half of a reservation mailbox.
pub struct ReservationMailbox {
    rx: watch::Receiver<Option<ReservationOutcome>>,
}

impl ReservationMailbox {
    /// Waits for a reservation result, up to `deadline`.
    ///
    /// A result delivered before this call is observed immediately.
    pub async fn wait(mut self, deadline: Duration) -> SignalWait {
        let waited = tokio::time::timeout(deadline, self.rx.wait_for(|slot| slot.is_some())).await;
        match waited {
            Ok(Ok(slot)) => match slot.clone() {
                Some(outcome) => SignalWait::Received(outcome),
                // wait_for only yields on a filled slot; an empty one
                // must never read as a confirmation.
                None => SignalWait::TimedOut,
            },
            // Sender dropped means the registry entry was removed while
            // we were waiting; treat it like a missed deadline.
            Ok(Err(_)) | Err(_) => SignalWait::TimedOut,
        }
    }
}
