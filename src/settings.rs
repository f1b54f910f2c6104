//! Resolved application settings.
//!
//! The settings store is the configuration provider read by the cached
//! Key Vault health check. It is seeded from the `[settings]` table, then
//! environment overrides, then secrets preloaded from Key Vault at startup.
//! After startup the store is read-only.

use std::collections::BTreeMap;

use crate::config::{AppConfig, SETTINGS_ENV_PREFIX};
use crate::keyvault::{SecretClient, SecretError};

/// Capability to read a configuration value by key.
pub trait ConfigProvider: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;
}

/// In-memory settings map.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    values: BTreeMap<String, String>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the config file's `[settings]` table.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            values: config.settings.clone(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Environment variable name overriding `key`
    pub fn env_key(key: &str) -> String {
        format!("{}{}", SETTINGS_ENV_PREFIX, key.to_ascii_uppercase())
    }

    /// Apply overrides from `lookup` for every present key and every key in `extra_keys`.
    ///
    /// Returns the number of overridden keys.
    pub fn apply_overrides<F>(&mut self, extra_keys: &[String], lookup: F) -> usize
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        keys.extend(extra_keys.iter().cloned());
        keys.sort();
        keys.dedup();

        let mut applied = 0;
        for key in keys {
            if let Some(value) = lookup(&Self::env_key(&key)) {
                tracing::debug!(key = %key, "Setting overridden from environment");
                self.values.insert(key, value);
                applied += 1;
            }
        }
        applied
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self, extra_keys: &[String]) -> usize {
        self.apply_overrides(extra_keys, |name| std::env::var(name).ok())
    }

    /// Fetch each named secret once and store it under its own name.
    ///
    /// Failures are logged and skipped; the cached health check then reports
    /// the missing value. Returns the number of secrets loaded.
    pub async fn preload_secrets(&mut self, client: &dyn SecretClient, names: &[String]) -> usize {
        let mut loaded = 0;
        for name in names {
            match client.get_secret(name).await {
                Ok(secret) => match secret.value {
                    Some(value) => {
                        self.values.insert(name.clone(), value);
                        loaded += 1;
                    }
                    None => {
                        tracing::warn!(secret = %name, "Preloaded secret has no value");
                    }
                },
                Err(e) => {
                    tracing::warn!(secret = %name, error = %e, "Failed to preload secret");
                }
            }
        }
        loaded
    }
}

impl ConfigProvider for SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.values.get(key).cloned())
    }
}
