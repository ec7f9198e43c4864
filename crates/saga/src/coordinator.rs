//! Saga coordinator for orchestrating payment sagas.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{PaymentId, PaymentRequest, PaymentResult, PaymentStatus, ReservationOutcome};
use gateway::{GatewayError, PaymentGateway};
use journal::{JournalError, SagaJournal, SagaJournalExt, TransitionRecord};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::SagaError;
use crate::events::{PublicationKind, SagaEvent};
use crate::instance::SagaInstance;
use crate::mailbox::{Delivery, SignalRegistry, SignalWait};
use crate::payment_flow;
use crate::scope::{CancellableScope, ScopeOutcome};
use crate::state::SagaState;

/// Deadlines for the two timeout tiers of a payment saga.
///
/// The two deadlines are independent; neither is assumed to dominate
/// the other. With the defaults the overall deadline fires first, so a
/// saga still awaiting confirmation is aborted before the signal wait
/// can elapse on its own.
#[derive(Debug, Clone, Copy)]
pub struct SagaConfig {
    /// How long to wait for the reservation outcome signal.
    pub signal_wait: Duration,
    /// Deadline for the whole saga sequence.
    pub overall_timeout: Duration,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            signal_wait: Duration::from_secs(20 * 60),
            overall_timeout: Duration::from_secs(10 * 60),
        }
    }
}

/// Orchestrates the execution of payment sagas.
///
/// The coordinator drives each saga through reserve → await
/// confirmation → transfer → publish. Every transition is journaled
/// before the next step runs, so a saga can be resumed from its last
/// committed transition without repeating effects it already performed.
pub struct SagaCoordinator<J, G>
where
    J: SagaJournal,
    G: PaymentGateway,
{
    journal: J,
    gateway: G,
    signals: SignalRegistry,
    // One run guard per in-flight payment; drivers serialize on it.
    runs: Mutex<HashMap<PaymentId, Arc<Mutex<()>>>>,
    config: SagaConfig,
}

impl<J, G> SagaCoordinator<J, G>
where
    J: SagaJournal + 'static,
    G: PaymentGateway + 'static,
{
    /// Creates a new coordinator with the default deadlines.
    pub fn new(journal: J, gateway: G) -> Self {
        Self::with_config(journal, gateway, SagaConfig::default())
    }

    /// Creates a new coordinator with explicit deadlines.
    pub fn with_config(journal: J, gateway: G, config: SagaConfig) -> Self {
        Self {
            journal,
            gateway,
            signals: SignalRegistry::new(),
            runs: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Starts a saga for a payment request and returns its saga ID.
    ///
    /// The saga runs on a background task; the caller never blocks on
    /// its completion. Starting a second saga for the same payment ID
    /// fails with [`SagaError::AlreadyStarted`].
    #[tracing::instrument(
        skip(self, request),
        fields(payment_id = %request.payment_id, saga_type = payment_flow::SAGA_TYPE)
    )]
    pub async fn start(self: &Arc<Self>, request: PaymentRequest) -> Result<String, SagaError> {
        metrics::counter!("saga_executions_total").increment(1);
        let payment_id = request.payment_id.clone();

        let mut instance = SagaInstance::default();
        let started = SagaEvent::saga_started(request, payment_flow::SAGA_TYPE);
        match self.record(&payment_id, &mut instance, started).await {
            Ok(()) => {}
            Err(SagaError::Journal(JournalError::SequenceConflict { .. })) => {
                return Err(SagaError::AlreadyStarted(payment_id));
            }
            Err(err) => return Err(err),
        }

        // The mailbox must exist before the reservation request goes
        // out, so an outcome delivered immediately is not lost.
        self.signals.register(&payment_id).await;

        let saga_id = payment_flow::saga_id(&payment_id);
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(error) = coordinator.drive(payment_id.clone()).await {
                tracing::error!(payment_id = %payment_id, %error, "saga run failed");
            }
        });

        Ok(saga_id)
    }

    /// Delivers a reservation outcome to the matching saga's mailbox.
    ///
    /// Late and duplicate deliveries are acknowledged and dropped; only
    /// the first outcome per payment reaches the waiting saga.
    #[tracing::instrument(skip(self, outcome), fields(payment_id = %payment_id))]
    pub async fn deliver(
        &self,
        payment_id: &PaymentId,
        outcome: ReservationOutcome,
    ) -> Delivery {
        metrics::counter!("saga_signals_total").increment(1);
        let delivery = self.signals.deliver(payment_id, outcome).await;
        tracing::info!(?delivery, "reservation outcome delivered");
        delivery
    }

    /// Resumes a saga from its journaled transitions and runs it to a
    /// terminal result.
    ///
    /// Already-committed effects are skipped; a saga that already
    /// emitted its publication returns its result without new calls.
    pub async fn resume(&self, payment_id: &PaymentId) -> Result<PaymentResult, SagaError> {
        self.drive(payment_id.clone()).await
    }

    /// Loads a saga instance by replaying its journal, or None if no
    /// saga exists for this payment.
    pub async fn load(&self, payment_id: &PaymentId) -> Result<Option<SagaInstance>, SagaError> {
        let records = self.journal.records_for(payment_id).await?;
        if records.is_empty() {
            return Ok(None);
        }

        let mut instance = SagaInstance::default();
        for record in records {
            let seq = record.seq;
            let event: SagaEvent = serde_json::from_value(record.payload)?;
            instance.apply(event);
            instance.set_seq(seq);
        }
        Ok(Some(instance))
    }

    /// Returns the terminal result of a saga once its publication has
    /// been emitted, or None while it is still in flight.
    pub async fn result_of(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<PaymentResult>, SagaError> {
        Ok(self
            .load(payment_id)
            .await?
            .filter(SagaInstance::publication_emitted)
            .and_then(|instance| instance.result()))
    }

    /// Runs a saga to its terminal result, one driver at a time.
    ///
    /// The background task spawned by [`Self::start`] and any
    /// concurrent [`Self::resume`] serialize on a per-payment run
    /// guard, and the instance is reloaded from the journal under that
    /// guard. A driver lining up behind a finished run therefore sees
    /// the journaled publication checkpoint and emits nothing.
    async fn drive(&self, payment_id: PaymentId) -> Result<PaymentResult, SagaError> {
        let run = self.run_slot(&payment_id).await;
        let guard = run.lock().await;
        let result = self.drive_locked(&payment_id).await;
        drop(guard);
        self.release_run(&payment_id, run).await;
        result
    }

    /// Runs the saga sequence. The caller holds the payment's run
    /// guard.
    ///
    /// The whole step sequence is bounded by the overall deadline. If
    /// the deadline fires first the sequence is abandoned and the
    /// rejection publication runs detached, outside the cancelled
    /// scope.
    async fn drive_locked(&self, payment_id: &PaymentId) -> Result<PaymentResult, SagaError> {
        let mut instance = self
            .load(payment_id)
            .await?
            .ok_or_else(|| SagaError::NotFound(payment_id.clone()))?;

        let saga_start = std::time::Instant::now();
        let scope = CancellableScope::new();
        let outcome = {
            let sequence = self.advance(&mut instance, payment_id, scope.token());
            scope
                .run_until_deadline(self.config.overall_timeout, sequence)
                .await
        };

        let result = match outcome {
            ScopeOutcome::Finished(result) => result,
            ScopeOutcome::DeadlineReached => {
                tracing::warn!(payment_id = %payment_id, "overall saga deadline reached");
                // A saga already terminal just emits its pending
                // publication; an in-flight one is aborted first.
                let cleanup = async {
                    if !instance.state().is_terminal() {
                        self.record(
                            payment_id,
                            &mut instance,
                            SagaEvent::overall_timeout_reached(),
                        )
                        .await?;
                    }
                    self.finish(payment_id, &mut instance).await
                };
                cleanup.await
            }
        };

        self.signals.unregister(payment_id).await;
        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        result
    }

    /// Returns the run guard for a payment, creating it if absent.
    async fn run_slot(&self, payment_id: &PaymentId) -> Arc<Mutex<()>> {
        let mut runs = self.runs.lock().await;
        runs.entry(payment_id.clone()).or_default().clone()
    }

    /// Drops a run guard and prunes the slot once no other driver
    /// holds it.
    async fn release_run(&self, payment_id: &PaymentId, run: Arc<Mutex<()>>) {
        let mut runs = self.runs.lock().await;
        drop(run);
        if runs
            .get(payment_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            runs.remove(payment_id);
        }
    }

    /// Advances the saga from its current state until it terminates.
    ///
    /// Each iteration is one decision over the replayed state, one
    /// side-effecting call at most, and one journaled checkpoint.
    async fn advance(
        &self,
        instance: &mut SagaInstance,
        payment_id: &PaymentId,
        cancel: &CancellationToken,
    ) -> Result<PaymentResult, SagaError> {
        loop {
            match instance.state() {
                SagaState::NotStarted => {
                    return Err(SagaError::NotFound(payment_id.clone()));
                }

                SagaState::Reserving => {
                    self.gateway
                        .submit_reservation(payment_id)
                        .await
                        .map_err(SagaError::Reservation)?;
                    self.record(payment_id, instance, SagaEvent::reservation_requested())
                        .await?;
                }

                SagaState::AwaitingConfirmation => {
                    let mailbox = self.signals.register(payment_id).await;
                    tracing::info!(payment_id = %payment_id, "awaiting reservation confirmation");
                    match mailbox.wait(self.config.signal_wait).await {
                        SignalWait::Received(outcome) if outcome.success => {
                            self.record(payment_id, instance, SagaEvent::reservation_confirmed())
                                .await?;
                        }
                        SignalWait::Received(outcome) => {
                            let reason = outcome.reason.unwrap_or_else(|| {
                                payment_flow::REASON_RESERVATION_REJECTED.to_string()
                            });
                            self.record(
                                payment_id,
                                instance,
                                SagaEvent::reservation_rejected(reason),
                            )
                            .await?;
                        }
                        SignalWait::TimedOut => {
                            self.record(
                                payment_id,
                                instance,
                                SagaEvent::reservation_timed_out(
                                    self.config.signal_wait.as_secs(),
                                ),
                            )
                            .await?;
                        }
                    }
                }

                SagaState::Transferring => {
                    match self.gateway.execute_transfer(payment_id, cancel).await {
                        Ok(outcome) => {
                            self.record(
                                payment_id,
                                instance,
                                SagaEvent::transfer_executed(outcome.status),
                            )
                            .await?;
                        }
                        // Cancellation unwinds the sequence; the deadline
                        // path owns the cleanup publication.
                        Err(GatewayError::Cancelled) => return Err(SagaError::Cancelled),
                        Err(error) => {
                            self.record(
                                payment_id,
                                instance,
                                SagaEvent::transfer_failed(error.to_string()),
                            )
                            .await?;
                        }
                    }
                }

                SagaState::RejectedNoSignal
                | SagaState::RejectedByCounterparty
                | SagaState::Completed
                | SagaState::Failed
                | SagaState::Aborted => {
                    return self.finish(payment_id, instance).await;
                }
            }
        }
    }

    /// Emits the terminal publication (once) and produces the result.
    ///
    /// A publish failure is surfaced as an error without recording the
    /// publication, so a later resume attempts it again.
    async fn finish(
        &self,
        payment_id: &PaymentId,
        instance: &mut SagaInstance,
    ) -> Result<PaymentResult, SagaError> {
        let result = instance.result().ok_or_else(|| SagaError::InvalidState {
            payment_id: payment_id.clone(),
            state: instance.state(),
        })?;

        if !instance.publication_emitted() {
            let kind = match result.status {
                PaymentStatus::Completed => {
                    self.gateway
                        .publish_completed(payment_id)
                        .await
                        .map_err(SagaError::Publication)?;
                    PublicationKind::Completed
                }
                PaymentStatus::Failed | PaymentStatus::Rejected => {
                    let reason = result
                        .message
                        .as_deref()
                        .unwrap_or(payment_flow::REASON_RESERVATION_REJECTED);
                    self.gateway
                        .publish_rejected(payment_id, reason)
                        .await
                        .map_err(SagaError::Publication)?;
                    PublicationKind::Rejected
                }
            };
            self.record(
                payment_id,
                instance,
                SagaEvent::publication_emitted(kind, result.message.clone()),
            )
            .await?;

            match kind {
                PublicationKind::Completed => {
                    metrics::counter!("saga_completed").increment(1);
                    tracing::info!(payment_id = %payment_id, "saga completed");
                }
                PublicationKind::Rejected => {
                    metrics::counter!("saga_rejected").increment(1);
                    tracing::warn!(
                        payment_id = %payment_id,
                        status = %result.status,
                        reason = result.message.as_deref().unwrap_or(""),
                        "saga did not complete"
                    );
                }
            }
        }

        Ok(result)
    }

    /// Journals a single transition and applies it to the instance.
    async fn record(
        &self,
        payment_id: &PaymentId,
        instance: &mut SagaInstance,
        event: SagaEvent,
    ) -> Result<(), SagaError> {
        let record = TransitionRecord::builder()
            .event_type(event.event_type())
            .payment_id(payment_id.clone())
            .seq(instance.seq().next())
            .payload(&event)?
            .build();

        let new_seq = self
            .journal
            .append_record(record, Some(instance.seq()))
            .await?;

        instance.apply(event);
        instance.set_seq(new_seq);
        Ok(())
    }
}
