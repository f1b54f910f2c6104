//! End-to-end tests against a local fake Key Vault.
//!
//! The fake vault is an axum server on an ephemeral port; the real
//! `KeyVaultClient`, settings preloading and router are wired the same way
//! `main` wires them.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use carts_api::config::AppConfig;
use carts_api::keyvault::KeyVaultClient;
use carts_api::routes::{create_router, CART_KEY_VAULT_HEALTH_PATH, KEY_VAULT_HEALTH_PATH};
use carts_api::settings::SettingsStore;
use carts_api::state::AppState;
use carts_api::telemetry::TelemetryClient;

const CONNECTION_STRING: &str = "InstrumentationKey=00000000-0000-0000-0000-000000000000;IngestionEndpoint=https://westeurope-5.in.applicationinsights.azure.com/;LiveEndpoint=https://westeurope.livediagnostics.monitor.azure.com/";

async fn secret(Path(name): Path<String>) -> Response {
    match name.as_str() {
        "appInsightsConnectionString" => Json(serde_json::json!({
            "value": CONNECTION_STRING,
            "id": "https://fake.vault/secrets/appInsightsConnectionString/1"
        }))
        .into_response(),
        "slowSecret" => {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Json(serde_json::json!({ "value": CONNECTION_STRING })).into_response()
        }
        "wrongSecret" => Json(serde_json::json!({ "value": "Server=db;Database=carts" })).into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": { "code": "SecretNotFound", "message": "not found" }
            })),
        )
            .into_response(),
    }
}

async fn spawn_fake_vault() -> String {
    let app = Router::new().route("/secrets/{name}", get(secret));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Build the app the way `main` does, probing `secret_name`
async fn build_app(vault_url: &str, secret_name: &str, threshold_ms: u64, preload: &[&str]) -> Router {
    let preload = preload
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ");
    let toml = format!(
        r#"
        [http]
        host = "127.0.0.1"
        port = 8080

        [key_vault]
        vault_url = "{vault_url}"
        access_token = "test-token"
        preload = [{preload}]

        [health]
        secret_name = "{secret_name}"
        setting_key = "{secret_name}"
        latency_threshold_ms = {threshold_ms}

        [telemetry]
        role_name = "carts-api-test"
        "#
    );
    let config = AppConfig::from_toml_str(&toml).unwrap();

    let secrets = Arc::new(KeyVaultClient::new(&config.key_vault).unwrap());
    let mut settings = SettingsStore::from_config(&config);
    settings
        .preload_secrets(secrets.as_ref(), &config.key_vault.preload)
        .await;
    let telemetry = TelemetryClient::from_config(&config.telemetry);

    create_router(AppState::new(&config, secrets, Arc::new(settings), telemetry))
}

async fn call(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn live_probe_reports_latency() {
    let vault = spawn_fake_vault().await;
    let app = build_app(&vault, "appInsightsConnectionString", 5_000, &[]).await;

    let (status, body) = call(app, CART_KEY_VAULT_HEALTH_PATH).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("All good here - KeyVault accessible :) - responds in "));
    assert!(body.ends_with(" ms."));
}

#[tokio::test]
async fn live_probe_slow_vault_is_degraded() {
    let vault = spawn_fake_vault().await;
    let app = build_app(&vault, "slowSecret", 50, &[]).await;

    let (status, body) = call(app, CART_KEY_VAULT_HEALTH_PATH).await;

    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(body, "Service degraded: KeyVault response slow.");
}

#[tokio::test]
async fn live_probe_wrong_content_is_bad_gateway() {
    let vault = spawn_fake_vault().await;
    let app = build_app(&vault, "wrongSecret", 5_000, &[]).await;

    let (status, body) = call(app, CART_KEY_VAULT_HEALTH_PATH).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, "Unable to retrieve valid KeyVault secret.");
}

#[tokio::test]
async fn live_probe_missing_secret_is_request_failure() {
    let vault = spawn_fake_vault().await;
    let app = build_app(&vault, "doesNotExist", 5_000, &[]).await;

    let (status, body) = call(app, CART_KEY_VAULT_HEALTH_PATH).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, "Unable to retrieve KeyVault secret due to a request failure.");
}

#[tokio::test]
async fn cached_probe_uses_preloaded_secret() {
    let vault = spawn_fake_vault().await;
    let app = build_app(
        &vault,
        "appInsightsConnectionString",
        5_000,
        &["appInsightsConnectionString"],
    )
    .await;

    let (status, body) = call(app, KEY_VAULT_HEALTH_PATH).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "true");
}

#[tokio::test]
async fn cached_probe_without_preload_is_bad_gateway() {
    let vault = spawn_fake_vault().await;
    let app = build_app(&vault, "appInsightsConnectionString", 5_000, &[]).await;

    let (status, body) = call(app, KEY_VAULT_HEALTH_PATH).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, "Unable to retrieve valid KeyVault secret.");
}

#[tokio::test]
async fn cached_probe_survives_failed_preload() {
    let vault = spawn_fake_vault().await;
    let app = build_app(&vault, "doesNotExist", 5_000, &["doesNotExist"]).await;

    let (status, _) = call(app, KEY_VAULT_HEALTH_PATH).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
