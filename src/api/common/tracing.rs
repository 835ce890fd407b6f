//! Span and logging hooks for `tower_http::trace::TraceLayer`.

use axum::body::Body;
use axum::http::{Request, Response};
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tracing::{info_span, Span};

fn header<'a>(request: &'a Request<Body>, name: &str) -> &'a str {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// One span per request, keyed by the caller's request id when present.
pub fn make_request_span(request: &Request<Body>) -> Span {
    info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri().path(),
        query = ?request.uri().query(),
        request_id = header(request, "x-request-id"),
        user_agent = header(request, "user-agent"),
    )
}

pub fn on_request(request: &Request<Body>, _span: &Span) {
    tracing::debug!(method = %request.method(), uri = %request.uri(), "Incoming HTTP request");
}

/// Logs completion at a level that follows the status class.
pub fn on_response(response: &Response<Body>, latency: Duration, _span: &Span) {
    let status = response.status();
    let latency_ms = latency.as_millis();

    if status.is_server_error() {
        tracing::error!(%status, latency_ms, "HTTP request completed with server error");
    } else if status.is_client_error() {
        tracing::warn!(%status, latency_ms, "HTTP request completed with client error");
    } else {
        tracing::info!(%status, latency_ms, "HTTP request completed");
    }
}

pub fn on_failure(error: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    let error_type = match &error {
        ServerErrorsFailureClass::StatusCode(code) => format!("HTTP {}", code.as_u16()),
        ServerErrorsFailureClass::Error(_) => "Internal Error".to_string(),
    };

    tracing::error!(
        error = %error,
        latency_ms = latency.as_millis(),
        error_type,
        "HTTP request failed"
    );
}
