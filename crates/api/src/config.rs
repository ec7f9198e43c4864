//! Application configuration loaded from environment variables.

use std::time::Duration;

use saga::SagaConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `PAYMENT_API_URL` — base URL of the counterparty payment API
///   (default: `"http://localhost:8080"`)
/// - `SIGNAL_WAIT_SECS` — reservation signal wait deadline (default: 1200)
/// - `OVERALL_TIMEOUT_SECS` — overall saga deadline (default: 600)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub payment_api_url: String,
    pub saga: SagaConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = SagaConfig::default();
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            payment_api_url: std::env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            saga: SagaConfig {
                signal_wait: env_secs("SIGNAL_WAIT_SECS").unwrap_or(defaults.signal_wait),
                overall_timeout: env_secs("OVERALL_TIMEOUT_SECS")
                    .unwrap_or(defaults.overall_timeout),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            payment_api_url: "http://localhost:8080".to_string(),
            saga: SagaConfig::default(),
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}
