//! Configuration loading and constants.
//!
//! Loads application configuration from TOML files and defines constants for
//! the health-check policy, Key Vault access, telemetry tagging, logging format,
//! and default paths. `AppConfig` is the root configuration struct containing all settings.

use std::collections::BTreeMap;
use std::path::Path;

use const_format::formatcp;
use serde::Deserialize;

// =============================================================================
// Health Check Policy
// =============================================================================

/// Secret probed by the live Key Vault health check
pub const DEFAULT_HEALTH_SECRET_NAME: &str = "appInsightsConnectionString";

/// Token whose presence marks a retrieved secret as valid
pub const DEFAULT_HEALTH_MARKER: &str = "IngestionEndpoint";

/// Retrievals slower than this are reported as degraded
pub const DEFAULT_LATENCY_THRESHOLD_MS: u64 = 100;

/// Health responses must never be served from an intermediate cache
pub const CACHE_CONTROL_HEALTH: &str = "no-store";

// =============================================================================
// Key Vault
// =============================================================================

/// Key Vault REST API version used for secret reads
pub const KEYVAULT_API_VERSION: &str = "7.4";

/// Environment variable holding the bearer token for Key Vault
pub const DEFAULT_KEYVAULT_TOKEN_ENV: &str = "KEYVAULT_ACCESS_TOKEN";

/// Per-request timeout for Key Vault calls
pub const KEYVAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent sent with Key Vault requests
pub const KEYVAULT_USER_AGENT: &str = formatcp!("carts-api/{}", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Settings
// =============================================================================

/// Prefix for environment variables that override `[settings]` entries
pub const SETTINGS_ENV_PREFIX: &str = "CARTS_";

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default logical role name stamped on telemetry
pub const DEFAULT_ROLE_NAME: &str = "carts-api";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "carts_api=debug,tower_http=debug";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Tracing target used for emitted telemetry records
pub const TELEMETRY_TARGET: &str = "telemetry";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    /// Key Vault endpoint and credentials
    pub key_vault: KeyVaultConfig,
    #[serde(default)]
    pub health: HealthConfig,
    /// Plain key/value settings served by the cached-configuration probe
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown (default: 30)
    #[serde(default = "HttpServerConfig::default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl HttpServerConfig {
    fn default_shutdown_grace() -> u64 {
        30
    }
}

/// Key Vault connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct KeyVaultConfig {
    /// Vault base URL, e.g. `https://contoso.vault.azure.net`
    pub vault_url: String,
    #[serde(default = "KeyVaultConfig::default_api_version")]
    pub api_version: String,
    /// Bearer token given inline (takes precedence over `access_token_env`)
    pub access_token: Option<String>,
    /// Environment variable to read the bearer token from
    #[serde(default = "KeyVaultConfig::default_token_env")]
    pub access_token_env: String,
    #[serde(default = "KeyVaultConfig::default_timeout")]
    pub request_timeout_seconds: u64,
    /// Secrets fetched once at startup and copied into the settings store
    #[serde(default)]
    pub preload: Vec<String>,
}

impl KeyVaultConfig {
    fn default_api_version() -> String {
        KEYVAULT_API_VERSION.to_string()
    }

    fn default_token_env() -> String {
        DEFAULT_KEYVAULT_TOKEN_ENV.to_string()
    }

    fn default_timeout() -> u64 {
        KEYVAULT_REQUEST_TIMEOUT_SECS
    }

    /// Resolve the bearer token: inline value first, then the environment.
    ///
    /// Returns `None` when neither is set; requests are then sent unauthenticated
    /// and Key Vault answers 401, which the health check reports as a request failure.
    pub fn resolve_access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var(&self.access_token_env).ok())
            .filter(|token| !token.is_empty())
    }
}

/// Health-check decision policy
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Secret retrieved by the live probe
    #[serde(default = "HealthConfig::default_secret_name")]
    pub secret_name: String,
    /// Settings key read by the cached-configuration probe
    #[serde(default = "HealthConfig::default_secret_name")]
    pub setting_key: String,
    #[serde(default = "HealthConfig::default_marker")]
    pub marker: String,
    #[serde(default = "HealthConfig::default_latency_threshold")]
    pub latency_threshold_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            secret_name: Self::default_secret_name(),
            setting_key: Self::default_secret_name(),
            marker: Self::default_marker(),
            latency_threshold_ms: Self::default_latency_threshold(),
        }
    }
}

impl HealthConfig {
    fn default_secret_name() -> String {
        DEFAULT_HEALTH_SECRET_NAME.to_string()
    }

    fn default_marker() -> String {
        DEFAULT_HEALTH_MARKER.to_string()
    }

    fn default_latency_threshold() -> u64 {
        DEFAULT_LATENCY_THRESHOLD_MS
    }
}

/// Telemetry tagging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// When false, telemetry records are dropped
    #[serde(default = "TelemetryConfig::default_enabled")]
    pub enabled: bool,
    /// Logical role name stamped on every record
    #[serde(default = "TelemetryConfig::default_role_name")]
    pub role_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            role_name: Self::default_role_name(),
        }
    }
}

impl TelemetryConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_role_name() -> String {
        DEFAULT_ROLE_NAME.to_string()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::Validation(
                "http.port must be non-zero".to_string(),
            ));
        }

        let url = self.key_vault.vault_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation(
                "key_vault.vault_url is required".to_string(),
            ));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "key_vault.vault_url must be an http(s) URL, got '{}'",
                url
            )));
        }

        if self.health.marker.is_empty() {
            return Err(ConfigError::Validation(
                "health.marker must not be empty".to_string(),
            ));
        }

        if self.telemetry.role_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "telemetry.role_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
