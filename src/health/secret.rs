//! Live Key Vault probe.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::instrument;

use super::{HealthCheckResult, HealthFailure, HealthPolicy};
use crate::keyvault::SecretClient;

/// Retrieves a well-known secret and judges latency and content.
pub struct SecretHealthProber {
    client: Arc<dyn SecretClient>,
    secret_name: String,
    policy: HealthPolicy,
}

impl SecretHealthProber {
    pub fn new(
        client: Arc<dyn SecretClient>,
        secret_name: impl Into<String>,
        policy: HealthPolicy,
    ) -> Self {
        Self {
            client,
            secret_name: secret_name.into(),
            policy,
        }
    }

    /// Run one probe.
    ///
    /// Latency is checked before content, and only when the retrieval
    /// succeeded: a slow response with bad content is still `Degraded`.
    #[instrument(name = "health::secret_probe", skip(self), fields(secret = %self.secret_name))]
    pub async fn probe(&self) -> HealthCheckResult {
        let started = Instant::now();
        let outcome = self.client.get_secret(&self.secret_name).await;
        let latency = started.elapsed();
        let elapsed_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(secret) => {
                if self.policy.is_slow(latency) {
                    tracing::warn!(
                        elapsed_ms,
                        threshold_ms = self.policy.latency_threshold_ms(),
                        "KeyVault secret retrieval is slow"
                    );
                    return HealthCheckResult::Degraded { latency };
                }

                if self.policy.is_valid(secret.value_or_empty()) {
                    tracing::debug!(elapsed_ms, "KeyVault secret retrieved");
                    HealthCheckResult::Healthy { latency }
                } else {
                    tracing::warn!(
                        elapsed_ms,
                        "Retrieved secret is invalid or does not contain the expected value"
                    );
                    HealthCheckResult::Unreachable(HealthFailure::InvalidContent)
                }
            }
            Err(e) if e.is_request_failure() => {
                tracing::error!(error = %e, elapsed_ms, "Azure Key Vault request failed");
                HealthCheckResult::Unreachable(HealthFailure::DependencyRequestFailure(e.to_string()))
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    elapsed_ms,
                    "An unexpected error occurred while accessing KeyVault"
                );
                HealthCheckResult::Unreachable(HealthFailure::UnexpectedFailure(e.to_string()))
            }
        }
    }
}
