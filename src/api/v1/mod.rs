//! Version 1 of the shorts API. Every route requires a valid token.

pub mod channels;
pub mod events;
pub mod shorts;
pub mod users;

use axum::routing::{get, post, put};
use axum::{middleware, Router};

use crate::api::common::middleware::auth_middleware;
use crate::InnerState;

#[tracing::instrument(name = "create_v1_router", skip(state))]
pub fn create_v1_router(state: InnerState) -> Router<InnerState> {
    tracing::info!("Creating V1 API router");

    Router::new()
        .route(
            "/api/v1/content-types/:content_type/compatible-targets",
            get(channels::compatible_target_types),
        )
        .route(
            "/api/v1/source-channels",
            get(channels::all_source_channels).post(channels::create_source_channel),
        )
        .route(
            "/api/v1/source-channels/:id",
            get(channels::get_source_channel).delete(channels::delete_source_channel),
        )
        .route("/api/v1/source-channels/:id/shorts", get(channels::source_channel_shorts))
        .route("/api/v1/source-channels/:id/roll", post(channels::roll))
        .route(
            "/api/v1/admin-channels",
            get(channels::all_admin_channels).post(channels::create_admin_channel),
        )
        .route("/api/v1/admin-channels/:id", get(channels::get_admin_channel))
        .route(
            "/api/v1/admin-channels/:id/compatible-sources",
            get(channels::compatible_sources),
        )
        .route("/api/v1/users", get(users::all_users).post(users::create_user))
        .route("/api/v1/users/:id/status", put(users::set_status))
        .route("/api/v1/users/:id/assistant-of", put(users::set_assistant_of))
        .route("/api/v1/users/:id/queue", get(users::queue))
        .route("/api/v1/users/:id/token", post(users::token))
        .route("/api/v1/shorts", get(shorts::all_shorts))
        .route("/api/v1/shorts/:id", get(shorts::get_short))
        .route("/api/v1/shorts/:id/retain", post(shorts::retain))
        .route("/api/v1/shorts/:id/reject", post(shorts::reject))
        .route("/api/v1/shorts/:id/assign", post(shorts::assign))
        .route("/api/v1/shorts/:id/reassign", post(shorts::reassign))
        .route("/api/v1/shorts/:id/start", post(shorts::start))
        .route("/api/v1/shorts/:id/complete", post(shorts::complete))
        .route("/api/v1/shorts/:id/validate", post(shorts::validate))
        .route("/api/v1/shorts/:id/reject-back", post(shorts::reject_back))
        .route("/api/v1/shorts/:id/publish", post(shorts::publish))
        .route("/api/v1/shorts/:id/comments", post(shorts::add_comment))
        .route("/api/v1/events", get(events::stream_events))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
