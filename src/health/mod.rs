//! Key Vault health checks.
//!
//! # Probes
//! ```text
//! SecretHealthProber (secret.rs):
//!     Key Vault GET secret, timed
//!     → slow?           Degraded     (206)
//!     → marker present? Healthy      (200, latency in body)
//!     → otherwise       Unreachable  (502)
//!
//! ConfigHealthProber (cached.rs):
//!     settings lookup, no network
//!     → marker present? Healthy      (200, `true`)
//!     → otherwise       Unreachable  (502)
//! ```
//!
//! Probes return a `HealthCheckResult`; translation to HTTP happens in the
//! `IntoResponse` impl below and in the route handlers. Nothing is retried.

mod cached;
mod secret;

pub use cached::ConfigHealthProber;
pub use secret::SecretHealthProber;

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::config::HealthConfig;

pub const MSG_DEGRADED: &str = "Service degraded: KeyVault response slow.";
pub const MSG_INVALID_CONTENT: &str = "Unable to retrieve valid KeyVault secret.";
pub const MSG_REQUEST_FAILURE: &str =
    "Unable to retrieve KeyVault secret due to a request failure.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred.";

/// Why a dependency is considered unreachable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HealthFailure {
    /// Value missing, empty, or without the marker
    #[error("secret is invalid or does not contain the expected value")]
    InvalidContent,

    #[error("dependency request failed: {0}")]
    DependencyRequestFailure(String),

    #[error("unexpected failure: {0}")]
    UnexpectedFailure(String),
}

impl HealthFailure {
    /// Message returned to the caller; internal detail stays in the logs
    pub fn public_message(&self) -> &'static str {
        match self {
            HealthFailure::InvalidContent => MSG_INVALID_CONTENT,
            HealthFailure::DependencyRequestFailure(_) => MSG_REQUEST_FAILURE,
            HealthFailure::UnexpectedFailure(_) => MSG_UNEXPECTED,
        }
    }
}

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckResult {
    Healthy { latency: Duration },
    /// Dependency answered, but slower than the threshold
    Degraded { latency: Duration },
    Unreachable(HealthFailure),
}

impl HealthCheckResult {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthCheckResult::Healthy { .. } => StatusCode::OK,
            HealthCheckResult::Degraded { .. } => StatusCode::PARTIAL_CONTENT,
            HealthCheckResult::Unreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthCheckResult::Healthy { .. })
    }

    /// Response body text for this outcome
    pub fn message(&self) -> String {
        match self {
            HealthCheckResult::Healthy { latency } => format!(
                "All good here - KeyVault accessible :) - responds in {} ms.",
                latency.as_millis()
            ),
            HealthCheckResult::Degraded { .. } => MSG_DEGRADED.to_string(),
            HealthCheckResult::Unreachable(failure) => failure.public_message().to_string(),
        }
    }
}

impl IntoResponse for HealthCheckResult {
    fn into_response(self) -> Response {
        (self.status_code(), self.message()).into_response()
    }
}

/// Content and latency rules shared by both probes
#[derive(Debug, Clone)]
pub struct HealthPolicy {
    marker: String,
    latency_threshold_ms: u64,
}

impl HealthPolicy {
    pub fn new(marker: impl Into<String>, latency_threshold_ms: u64) -> Self {
        Self {
            marker: marker.into(),
            latency_threshold_ms,
        }
    }

    pub fn from_config(config: &HealthConfig) -> Self {
        Self::new(config.marker.clone(), config.latency_threshold_ms)
    }

    /// A value is valid when non-empty and containing the marker
    pub fn is_valid(&self, value: &str) -> bool {
        !value.is_empty() && value.contains(&self.marker)
    }

    /// Compared in whole milliseconds, so 100.9 ms is not slow at a 100 ms threshold
    pub fn is_slow(&self, elapsed: Duration) -> bool {
        elapsed.as_millis() > u128::from(self.latency_threshold_ms)
    }

    pub fn latency_threshold_ms(&self) -> u64 {
        self.latency_threshold_ms
    }
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self::from_config(&HealthConfig::default())
    }
}
