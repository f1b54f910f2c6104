//! Startup error type.
//!
//! Request handlers never return `AppError`: probe outcomes are mapped to HTTP
//! responses in `health`. This type covers wiring failures that abort the binary.

use crate::config::ConfigError;
use crate::http::ServerError;
use crate::keyvault::SecretError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Key Vault client error: {0}")]
    KeyVault(#[from] SecretError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}
