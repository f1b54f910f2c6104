//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::health::{ConfigHealthProber, HealthPolicy, SecretHealthProber};
use crate::keyvault::SecretClient;
use crate::settings::ConfigProvider;
use crate::telemetry::TelemetryClient;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds both Key Vault probes and the telemetry client. Nothing here is
/// mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub secret_probe: Arc<SecretHealthProber>,
    pub config_probe: Arc<ConfigHealthProber>,
    pub telemetry: TelemetryClient,
}

impl AppState {
    /// Creates a new application state from configuration and the injected collaborators.
    pub fn new(
        config: &AppConfig,
        secrets: Arc<dyn SecretClient>,
        settings: Arc<dyn ConfigProvider>,
        telemetry: TelemetryClient,
    ) -> Self {
        let policy = HealthPolicy::from_config(&config.health);
        let secret_probe =
            SecretHealthProber::new(secrets, config.health.secret_name.clone(), policy.clone());
        let config_probe = ConfigHealthProber::new(settings, config.health.setting_key.clone(), policy);

        Self {
            secret_probe: Arc::new(secret_probe),
            config_probe: Arc::new(config_probe),
            telemetry,
        }
    }
}
