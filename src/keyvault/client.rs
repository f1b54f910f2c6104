//! Key Vault REST client.
//!
//! Reads secrets with `GET {vault}/secrets/{name}?api-version=...` using a
//! bearer token. Token acquisition is outside this client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use super::{KeyVaultSecret, SecretClient, SecretError};
use crate::config::{KeyVaultConfig, KEYVAULT_USER_AGENT};

/// Secret bundle returned by the Get Secret operation
#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: Option<String>,
    id: Option<String>,
}

/// Error envelope returned by Key Vault on failure
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

/// Extract a readable message from a Key Vault error body.
fn error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    match (envelope.error.code, envelope.error.message) {
        (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
        (Some(code), None) => Some(code),
        (None, Some(message)) => Some(message),
        (None, None) => None,
    }
}

/// Key Vault client backed by `reqwest`.
#[derive(Clone)]
pub struct KeyVaultClient {
    http_client: reqwest::Client,
    vault_url: String,
    api_version: String,
    access_token: Option<String>,
}

impl KeyVaultClient {
    pub fn new(config: &KeyVaultConfig) -> Result<Self, SecretError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(KEYVAULT_USER_AGENT)
            .build()
            .map_err(|e| SecretError::Unexpected(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            vault_url: config.vault_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            access_token: config.resolve_access_token(),
        })
    }

    /// Build the Get Secret URL for the latest version of `name`
    pub fn secret_url(&self, name: &str) -> String {
        format!(
            "{}/secrets/{}?api-version={}",
            self.vault_url,
            urlencoding::encode(name),
            self.api_version
        )
    }

    pub fn vault_url(&self) -> &str {
        &self.vault_url
    }
}

#[async_trait]
impl SecretClient for KeyVaultClient {
    #[instrument(name = "keyvault::get_secret", skip(self))]
    async fn get_secret(&self, name: &str) -> Result<KeyVaultSecret, SecretError> {
        let mut request = self.http_client.get(self.secret_url(name));
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SecretError::RequestFailed {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            tracing::debug!(status = status.as_u16(), %message, "Key Vault returned an error status");
            return Err(SecretError::RequestFailed {
                status: Some(status.as_u16()),
                message,
            });
        }

        let bundle: SecretBundle = response.json().await.map_err(|e| {
            if e.is_decode() {
                SecretError::Unexpected(format!("Malformed secret response: {}", e))
            } else {
                SecretError::RequestFailed {
                    status: Some(status.as_u16()),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(KeyVaultSecret {
            name: name.to_string(),
            value: bundle.value,
            id: bundle.id,
        })
    }
}
