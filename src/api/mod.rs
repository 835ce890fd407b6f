//! HTTP surface: system routes plus the versioned shorts API.

pub mod common;
pub mod v1;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::common::tracing::{make_request_span, on_failure, on_request, on_response};
use crate::system;
use crate::InnerState;

/// Full application router, without the metrics layer.
#[tracing::instrument(name = "create_app", skip(state))]
pub fn create_app(state: InnerState) -> Router {
    Router::new()
        .merge(system::create_system_router(state.clone()))
        .merge(v1::create_v1_router(state.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_request_span)
                .on_request(on_request)
                .on_response(on_response)
                .on_failure(on_failure),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
