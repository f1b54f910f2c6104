//! carts-api: Key Vault health endpoints for the carts service.
//!
//! This is the application entry point. It loads configuration from a TOML
//! file, initializes tracing, builds the Key Vault client and the settings
//! store (including secrets preloaded at startup), sets up the Axum router
//! and starts the HTTP server.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carts_api::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use carts_api::http::start_server;
use carts_api::keyvault::KeyVaultClient;
use carts_api::routes::create_router;
use carts_api::settings::SettingsStore;
use carts_api::state::AppState;
use carts_api::telemetry::TelemetryClient;
use carts_api::AppError;

/// carts-api: Key Vault health endpoints
#[derive(Parser, Debug)]
#[command(name = "carts-api", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "carts_api=debug,telemetry=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Logging format lives in the config file, so load it first
    let config = AppConfig::load(&args.config)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let json = config.logging.is_json();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&log_filter))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!(config = %args.config, "Loaded configuration");

    let secrets = Arc::new(KeyVaultClient::new(&config.key_vault)?);
    tracing::info!(
        vault = %secrets.vault_url(),
        has_token = config.key_vault.resolve_access_token().is_some(),
        "Key Vault client configured"
    );

    // Settings: file, then environment, then preloaded secrets
    let mut settings = SettingsStore::from_config(&config);
    let overridden = settings.apply_env_overrides(&[config.health.setting_key.clone()]);
    let preloaded = settings
        .preload_secrets(secrets.as_ref(), &config.key_vault.preload)
        .await;
    tracing::info!(
        settings = settings.len(),
        overridden,
        preloaded,
        requested = config.key_vault.preload.len(),
        "Resolved settings"
    );

    let telemetry = TelemetryClient::from_config(&config.telemetry);
    tracing::info!(
        enabled = telemetry.is_enabled(),
        role_name = %config.telemetry.role_name,
        "Initialized telemetry"
    );

    let state = AppState::new(&config, secrets, Arc::new(settings), telemetry);
    let app = create_router(state);

    start_server(app, &config.http).await?;

    Ok(())
}
