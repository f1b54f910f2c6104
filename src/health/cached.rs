//! Cached-configuration Key Vault probe.
//!
//! Checks the value that was resolved into settings at startup. No network
//! call is made, so there is no degraded state.

use std::sync::Arc;
use std::time::Duration;

use super::{HealthCheckResult, HealthFailure, HealthPolicy};
use crate::settings::ConfigProvider;

pub struct ConfigHealthProber {
    settings: Arc<dyn ConfigProvider>,
    key: String,
    policy: HealthPolicy,
}

impl ConfigHealthProber {
    pub fn new(settings: Arc<dyn ConfigProvider>, key: impl Into<String>, policy: HealthPolicy) -> Self {
        Self {
            settings,
            key: key.into(),
            policy,
        }
    }

    pub fn probe(&self) -> HealthCheckResult {
        match self.settings.get(&self.key) {
            Ok(value) => {
                if self.policy.is_valid(value.as_deref().unwrap_or("")) {
                    HealthCheckResult::Healthy {
                        latency: Duration::ZERO,
                    }
                } else {
                    tracing::warn!(
                        key = %self.key,
                        present = value.is_some(),
                        "Retrieved secret is invalid or does not contain the expected value"
                    );
                    HealthCheckResult::Unreachable(HealthFailure::InvalidContent)
                }
            }
            Err(e) if e.is_request_failure() => {
                tracing::error!(key = %self.key, error = %e, "Azure Key Vault request failed");
                HealthCheckResult::Unreachable(HealthFailure::DependencyRequestFailure(e.to_string()))
            }
            Err(e) => {
                tracing::error!(
                    key = %self.key,
                    error = %e,
                    "An unexpected error occurred while accessing KeyVault"
                );
                HealthCheckResult::Unreachable(HealthFailure::UnexpectedFailure(e.to_string()))
            }
        }
    }
}
