use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::InnerState;

/// Liveness plus a cheap store round-trip.
pub async fn health_check(State(inner): State<InnerState>) -> impl IntoResponse {
    match inner.service.list_admin_channels().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "error": e.kind() })),
            )
        }
    }
}
