//! HTTP route handlers.
//!
//! Health responses carry `Cache-Control: no-store` so probes always reach
//! the service. Paths are matched case-insensitively: routes are registered
//! lowercase and the request path is lowercased before routing, so
//! `/v1/CartHealth/KeyVaultHealth` and `/V1/CARTHEALTH/KEYVAULTHEALTH` reach
//! the same handler.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod health;

use axum::extract::Request;
use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::http::uri::{PathAndQuery, Uri};
use axum::{middleware, routing::get, Router};
use tower::ServiceExt;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_HEALTH;
use crate::middleware::request_id_layer;
use crate::state::AppState;

pub const LIVENESS_PATH: &str = "/health";
pub const CART_KEY_VAULT_HEALTH_PATH: &str = "/v1/CartHealth/KeyVaultHealth";
pub const KEY_VAULT_HEALTH_PATH: &str = "/Health/KeyVaultHealth";

/// Creates the Axum router with all routes and cache headers.
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route(LIVENESS_PATH, get(health::health))
        .route(
            &CART_KEY_VAULT_HEALTH_PATH.to_ascii_lowercase(),
            get(health::cart_key_vault_health),
        )
        .route(
            &KEY_VAULT_HEALTH_PATH.to_ascii_lowercase(),
            get(health::key_vault_health),
        )
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_HEALTH),
        ));

    let routes = Router::new()
        .merge(health_routes)
        .with_state(state.clone());

    // Routing happens before `Router::layer` middleware runs, so the path is
    // rewritten by a service wrapped around the inner router
    Router::new()
        .fallback_service(routes.map_request(lowercase_path))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn_with_state(state, request_id_layer))
}

/// Lowercase the request path, keeping the query string as sent.
fn lowercase_path(mut request: Request) -> Request {
    let uri = request.uri();
    if !uri.path().bytes().any(|b| b.is_ascii_uppercase()) {
        return request;
    }

    let lowered = match uri.query() {
        Some(query) => format!("{}?{}", uri.path().to_ascii_lowercase(), query),
        None => uri.path().to_ascii_lowercase(),
    };
    let Ok(path_and_query) = lowered.parse::<PathAndQuery>() else {
        return request;
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    if let Ok(uri) = Uri::from_parts(parts) {
        *request.uri_mut() = uri;
    }
    request
}
