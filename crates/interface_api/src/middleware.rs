//! API middleware

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn, Instrument};

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request logging middleware
///
/// Runs the request inside a span tagged with its request id and logs one
/// line per request once the response is ready.
pub async fn request_logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span = tracing::info_span!("http_request", request_id = %request_id);
    let start = Instant::now();

    let response = next.run(request).instrument(span.clone()).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;
    if status.is_server_error() {
        warn!(parent: &span, method = %method, uri = %uri, status = status.as_u16(), duration_ms, "API request failed");
    } else {
        info!(parent: &span, method = %method, uri = %uri, status = status.as_u16(), duration_ms, "API request");
    }

    response
}
