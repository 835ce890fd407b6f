use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::common::middleware::issue_token;
use crate::api::common::ApiResponse;
use crate::domain::{Role, Short, User, UserStatus};
use crate::errors::AppError;
use crate::service::NewUser;
use crate::InnerState;

const TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: UserStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantPayload {
    pub videaste_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[tracing::instrument(name = "Create user handler", skip(inner, actor, payload))]
pub async fn create_user(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let user = inner.service.create_user(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

#[tracing::instrument(name = "List users", skip(inner))]
pub async fn all_users(
    State(inner): State<InnerState>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    Ok(Json(ApiResponse::success(inner.service.list_users().await?)))
}

#[tracing::instrument(name = "Set user status handler", skip(inner, actor, payload))]
pub async fn set_status(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = inner.service.set_user_status(&actor, id, payload.status).await?;
    Ok(Json(ApiResponse::success(user)))
}

#[tracing::instrument(name = "Link assistant handler", skip(inner, actor, payload))]
pub async fn set_assistant_of(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssistantPayload>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = inner
        .service
        .link_assistant(&actor, id, payload.videaste_id)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

#[tracing::instrument(name = "Work queue", skip(inner, actor))]
pub async fn queue(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Short>>>, AppError> {
    if actor.id != id && actor.role != Role::Admin {
        return Err(AppError::InvalidActorRole(
            "Only admins can read another user's queue".to_string(),
        ));
    }
    Ok(Json(ApiResponse::success(inner.service.work_queue(id).await?)))
}

#[tracing::instrument(name = "Issue token", skip(inner, actor))]
pub async fn token(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    if !actor.is_active_with_role(Role::Admin) {
        return Err(AppError::InvalidActorRole(
            "Only active admins can issue tokens".to_string(),
        ));
    }
    let user = inner.service.user(id).await?;
    let token = issue_token(&user, &inner.jwt_secret, Duration::days(TOKEN_TTL_DAYS))?;
    Ok(Json(ApiResponse::success(TokenResponse { token })))
}
