//! In-memory gateway for tests.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use common::{PaymentId, TransferOutcome};

use crate::client::PaymentGateway;
use crate::retry::{RetryPolicy, retry_with_policy};
use crate::GatewayError;

#[derive(Debug)]
struct InMemoryGatewayState {
    fraud_checks: Vec<PaymentId>,
    reservations: Vec<PaymentId>,
    transfer_attempts: u32,
    transfer_status: String,
    transfer_failures: u32,
    transfer_client_error: Option<u16>,
    fail_reservation: bool,
    fail_publish: bool,
    completed: Vec<PaymentId>,
    rejected: Vec<(PaymentId, String)>,
}

impl Default for InMemoryGatewayState {
    fn default() -> Self {
        Self {
            fraud_checks: Vec::new(),
            reservations: Vec::new(),
            transfer_attempts: 0,
            transfer_status: TransferOutcome::CONTINUE.to_string(),
            transfer_failures: 0,
            transfer_client_error: None,
            fail_reservation: false,
            fail_publish: false,
            completed: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// In-memory payment gateway for testing.
///
/// Records every call and exposes knobs to inject business rejections,
/// transient failures, client errors and publish failures. Transfer retries
/// run through the same retry policy as the HTTP gateway.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
    retry: RetryPolicy,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway with the default retry policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the transfer retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the status token returned by subsequent transfers.
    pub fn set_transfer_status(&self, status: impl Into<String>) {
        self.state.write().unwrap().transfer_status = status.into();
    }

    /// Makes the next `n` transfer attempts fail with a retryable 503.
    pub fn set_transfer_failures(&self, n: u32) {
        self.state.write().unwrap().transfer_failures = n;
    }

    /// Makes transfers fail with a non-retryable client error.
    pub fn set_transfer_client_error(&self, status: u16) {
        self.state.write().unwrap().transfer_client_error = Some(status);
    }

    /// Makes reservation submission fail with a transport error.
    pub fn set_fail_reservation(&self, fail: bool) {
        self.state.write().unwrap().fail_reservation = fail;
    }

    /// Makes publish calls fail with a retryable 503.
    pub fn set_fail_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_publish = fail;
    }

    /// Returns the number of reservation submissions recorded.
    pub fn reservation_count(&self) -> usize {
        self.state.read().unwrap().reservations.len()
    }

    /// Returns the number of fraud checks recorded.
    pub fn fraud_check_count(&self) -> usize {
        self.state.read().unwrap().fraud_checks.len()
    }

    /// Returns the number of individual transfer attempts, retries included.
    pub fn transfer_attempts(&self) -> u32 {
        self.state.read().unwrap().transfer_attempts
    }

    /// Returns the payments for which a completion was published.
    pub fn completed_publications(&self) -> Vec<PaymentId> {
        self.state.read().unwrap().completed.clone()
    }

    /// Returns the payments and reasons for which a rejection was published.
    pub fn rejected_publications(&self) -> Vec<(PaymentId, String)> {
        self.state.read().unwrap().rejected.clone()
    }

    /// Returns the total number of publications of either kind.
    pub fn publication_count(&self) -> usize {
        let state = self.state.read().unwrap();
        state.completed.len() + state.rejected.len()
    }

    fn transfer_once(&self, payment_id: &PaymentId) -> Result<TransferOutcome, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.transfer_attempts += 1;

        if let Some(status) = state.transfer_client_error {
            return Err(GatewayError::Client {
                status,
                payment_id: payment_id.clone(),
            });
        }

        if state.transfer_failures > 0 {
            state.transfer_failures -= 1;
            return Err(GatewayError::Server { status: 503 });
        }

        Ok(TransferOutcome::new(state.transfer_status.clone()))
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn fraud_check(&self, payment_id: &PaymentId) -> Result<(), GatewayError> {
        self.state
            .write()
            .unwrap()
            .fraud_checks
            .push(payment_id.clone());
        Ok(())
    }

    async fn submit_reservation(&self, payment_id: &PaymentId) -> Result<(), GatewayError> {
        let mut state = self.state.write().unwrap();
        if state.fail_reservation {
            return Err(GatewayError::Transport("connection refused".into()));
        }
        state.reservations.push(payment_id.clone());
        Ok(())
    }

    async fn execute_transfer(
        &self,
        payment_id: &PaymentId,
        cancel: &CancellationToken,
    ) -> Result<TransferOutcome, GatewayError> {
        retry_with_policy(self.retry, cancel, || {
            let result = self.transfer_once(payment_id);
            async move { result }
        })
        .await
    }

    async fn publish_completed(&self, payment_id: &PaymentId) -> Result<(), GatewayError> {
        let mut state = self.state.write().unwrap();
        if state.fail_publish {
            return Err(GatewayError::Server { status: 503 });
        }
        state.completed.push(payment_id.clone());
        Ok(())
    }

    async fn publish_rejected(
        &self,
        payment_id: &PaymentId,
        reason: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.write().unwrap();
        if state.fail_publish {
            return Err(GatewayError::Server { status: 503 });
        }
        state
            .rejected
            .push((payment_id.clone(), reason.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_reservations_and_publications() {
        let gateway = InMemoryPaymentGateway::new();
        let id = PaymentId::new("PAY-1");

        gateway.submit_reservation(&id).await.unwrap();
        gateway.publish_completed(&id).await.unwrap();
        gateway.publish_rejected(&id, "nope").await.unwrap();

        assert_eq!(gateway.reservation_count(), 1);
        assert_eq!(gateway.completed_publications(), vec![id.clone()]);
        assert_eq!(
            gateway.rejected_publications(),
            vec![(id, "nope".to_string())]
        );
        assert_eq!(gateway.publication_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transfer_retries_transient_failures() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_transfer_failures(2);
        let cancel = CancellationToken::new();

        let outcome = gateway
            .execute_transfer(&PaymentId::new("PAY-1"), &cancel)
            .await
            .unwrap();

        assert!(outcome.is_continue());
        assert_eq!(gateway.transfer_attempts(), 3);
    }

    #[tokio::test]
    async fn transfer_client_error_is_not_retried() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_transfer_client_error(422);
        let cancel = CancellationToken::new();

        let err = gateway
            .execute_transfer(&PaymentId::new("PAY-1"), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Client { status: 422, .. }));
        assert_eq!(gateway.transfer_attempts(), 1);
    }

    #[tokio::test]
    async fn transfer_reports_business_status() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_transfer_status("pending-review");
        let cancel = CancellationToken::new();

        let outcome = gateway
            .execute_transfer(&PaymentId::new("PAY-1"), &cancel)
            .await
            .unwrap();

        assert_eq!(outcome.status, "pending-review");
        assert!(!outcome.is_continue());
    }
}
