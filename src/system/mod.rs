//! Unauthenticated system routes.

pub mod health_check;

use axum::{routing::get, Router};

use crate::InnerState;

#[tracing::instrument(name = "create_system_router", skip(state))]
pub fn create_system_router(state: InnerState) -> Router<InnerState> {
    tracing::info!("Creating system router");

    Router::new()
        .route("/health", get(health_check::health_check))
        .with_state(state)
}
