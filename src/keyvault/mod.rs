//! Secret retrieval from Azure Key Vault.
//!
//! `SecretClient` is the seam the health probes depend on; `KeyVaultClient`
//! implements it against the Key Vault REST API. Tests substitute their own
//! implementations to control latency and content.

mod client;

pub use client::KeyVaultClient;

use async_trait::async_trait;

/// Error type for secret retrieval
#[derive(Debug, Clone, thiserror::Error)]
pub enum SecretError {
    /// Key Vault answered with an error status, or the request never completed
    #[error("Key Vault request failed{}: {message}", status_suffix(.status))]
    RequestFailed { status: Option<u16>, message: String },

    /// Anything else: malformed responses, client construction failures
    #[error("Unexpected Key Vault error: {0}")]
    Unexpected(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" with status {}", code))
        .unwrap_or_default()
}

impl SecretError {
    /// Whether this is a dependency-specific request failure
    pub fn is_request_failure(&self) -> bool {
        matches!(self, SecretError::RequestFailed { .. })
    }
}

/// A secret as returned by Key Vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVaultSecret {
    pub name: String,
    /// Secret value; Key Vault omits it for some secret kinds
    pub value: Option<String>,
    /// Versioned secret identifier
    pub id: Option<String>,
}

impl KeyVaultSecret {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            id: None,
        }
    }

    /// The secret value, or an empty string when absent
    pub fn value_or_empty(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

/// Capability to read a named secret.
#[async_trait]
pub trait SecretClient: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<KeyVaultSecret, SecretError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_display_with_status() {
        let err = SecretError::RequestFailed {
            status: Some(403),
            message: "Forbidden".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Key Vault request failed with status 403: Forbidden"
        );
        assert!(err.is_request_failure());
    }

    #[test]
    fn test_request_failed_display_without_status() {
        let err = SecretError::RequestFailed {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Key Vault request failed: connection refused");
    }

    #[test]
    fn test_unexpected_is_not_request_failure() {
        let err = SecretError::Unexpected("bad body".to_string());
        assert!(!err.is_request_failure());
    }

    #[test]
    fn test_value_or_empty() {
        let secret = KeyVaultSecret {
            name: "s".to_string(),
            value: None,
            id: None,
        };
        assert_eq!(secret.value_or_empty(), "");
        assert_eq!(KeyVaultSecret::new("s", "v").value_or_empty(), "v");
    }
}
