//! Health check endpoints.
//!
//! `/health` is a plain liveness probe. The Key Vault endpoints run the
//! probes held in `AppState` and map their outcome to a status code:
//!
//! | Endpoint                        | Healthy                  | Degraded | Unreachable |
//! |---------------------------------|--------------------------|----------|-------------|
//! | `/v1/CartHealth/KeyVaultHealth` | 200, latency message     | 206      | 502         |
//! | `/Health/KeyVaultHealth`        | 200, `true`              | n/a      | 502         |

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use tracing::instrument;

use crate::health::HealthCheckResult;
use crate::state::AppState;

/// Liveness handler.
///
/// Returns "ok" whenever the process can answer HTTP; dependencies are not checked.
pub async fn health() -> &'static str {
    "ok"
}

/// Live Key Vault check: retrieves the secret and reports latency.
#[instrument(name = "health::cart_key_vault", skip(state))]
pub async fn cart_key_vault_health(State(state): State<AppState>) -> HealthCheckResult {
    state.secret_probe.probe().await
}

/// Cached Key Vault check: validates the secret already resolved into settings.
#[instrument(name = "health::key_vault", skip(state))]
pub async fn key_vault_health(State(state): State<AppState>) -> Response {
    match state.config_probe.probe() {
        HealthCheckResult::Healthy { .. } => Json(true).into_response(),
        other => other.into_response(),
    }
}
