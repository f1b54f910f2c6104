//! carts-api - Key Vault health checks for the carts service
//!
//! Exposes a live Key Vault probe, a probe over the cached configuration
//! value, and tags all emitted telemetry with the service role name.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod keyvault;
pub mod middleware;
pub mod routes;
pub mod settings;
pub mod state;
pub mod telemetry;

pub use error::AppError;
