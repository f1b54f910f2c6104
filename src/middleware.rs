//! Request ID middleware for correlating logs with requests.
//!
//! Generates a UUID v4 for each incoming request and creates a tracing span
//! that wraps the entire request lifecycle. All logs emitted during request
//! processing will include the request_id field for correlation. When the
//! response is ready, a request telemetry record is tracked; the telemetry
//! client stamps it with the service role name.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::state::AppState;
use crate::telemetry::TelemetryRecord;

/// Middleware that generates a request ID, creates a request span and
/// tracks one telemetry record per request.
///
/// This should be the outermost middleware layer so the span wraps
/// all request processing, including other middleware and handlers.
pub async fn request_id_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();

    async move {
        let response = next.run(request).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = response.status().as_u16();

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::info!(status, duration_ms, "Request completed");

        state.telemetry.track(
            TelemetryRecord::request(format!("{} {}", method, path), status, duration_ms)
                .with_property("request_id", request_id.to_string()),
        );

        response
    }
    .instrument(span)
    .await
}
