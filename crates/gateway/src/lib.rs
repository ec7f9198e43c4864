//! Activity gateway for the payment saga.
//!
//! Wraps every externally observable effect of a saga: the fire-and-forget
//! reservation submission, the synchronous transfer, and the terminal
//! publications. Failures are classified into retryable (5xx, transport)
//! and non-retryable (4xx) kinds; the transfer call performs bounded
//! retries with exponential backoff internally, so the orchestrator only
//! ever observes an outcome, a non-retryable error, or a cancellation.

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod retry;

pub use client::PaymentGateway;
pub use error::GatewayError;
pub use http::HttpPaymentGateway;
pub use memory::InMemoryPaymentGateway;
pub use retry::{RetryPolicy, retry_with_policy};
