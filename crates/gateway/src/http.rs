//! HTTP gateway implementation backed by `reqwest`.

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use common::{PaymentId, TransferOutcome};

use crate::client::PaymentGateway;
use crate::retry::{RetryPolicy, retry_with_policy};
use crate::GatewayError;

/// Gateway talking to the counterparty payment API over HTTP.
///
/// One instance is shared by all sagas; the underlying `reqwest` client
/// pools connections and tolerates arbitrary concurrent use.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpPaymentGateway {
    /// Creates a gateway against the given base URL with the default
    /// retry policy.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the transfer retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn classify(status: StatusCode, payment_id: &PaymentId) -> GatewayError {
        if status.is_client_error() {
            GatewayError::Client {
                status: status.as_u16(),
                payment_id: payment_id.clone(),
            }
        } else {
            GatewayError::Server {
                status: status.as_u16(),
            }
        }
    }

    async fn transfer_once(
        &self,
        payment_id: &PaymentId,
    ) -> Result<TransferOutcome, GatewayError> {
        let url = self.url(&format!("/api/payment/sepa/{payment_id}"));
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify(status, payment_id));
        }

        let outcome: TransferOutcome = response.json().await?;
        Ok(outcome)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn fraud_check(&self, payment_id: &PaymentId) -> Result<(), GatewayError> {
        let url = self.url(&format!("/api/payment/fraud-check/{payment_id}"));
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify(status, payment_id));
        }
        Ok(())
    }

    async fn submit_reservation(&self, payment_id: &PaymentId) -> Result<(), GatewayError> {
        tracing::info!(%payment_id, "sending reserve request");
        let url = self.url(&format!("/api/payment/reserve/{payment_id}"));
        let response = self.client.post(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify(status, payment_id));
        }
        tracing::info!(%payment_id, status = status.as_u16(), "reserve request accepted");
        Ok(())
    }

    async fn execute_transfer(
        &self,
        payment_id: &PaymentId,
        cancel: &CancellationToken,
    ) -> Result<TransferOutcome, GatewayError> {
        tracing::info!(%payment_id, "executing transfer");
        retry_with_policy(self.retry, cancel, || self.transfer_once(payment_id)).await
    }

    async fn publish_completed(&self, payment_id: &PaymentId) -> Result<(), GatewayError> {
        tracing::info!(%payment_id, "publishing payment-completed");
        let url = self.url("/api/payment/released");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify(status, payment_id));
        }
        Ok(())
    }

    async fn publish_rejected(
        &self,
        payment_id: &PaymentId,
        reason: &str,
    ) -> Result<(), GatewayError> {
        tracing::info!(%payment_id, reason, "publishing payment-rejected");
        let url = self.url(&format!("/api/payment/cancel/{payment_id}"));
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "reason": reason }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify(status, payment_id));
        }
        Ok(())
    }
}
