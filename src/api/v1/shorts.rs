use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::common::ApiResponse;
use crate::domain::{Comment, Short, User};
use crate::errors::AppError;
use crate::service::AssignShort;
use crate::store::ShortFilter;
use crate::InnerState;

type ShortResponse = Result<Json<ApiResponse<Short>>, AppError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignPayload {
    pub videaste_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePayload {
    pub artifact_url: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackPayload {
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentPayload {
    pub body: String,
}

#[tracing::instrument(name = "List shorts", skip(inner))]
pub async fn all_shorts(
    State(inner): State<InnerState>,
    Query(filter): Query<ShortFilter>,
) -> Result<Json<ApiResponse<Vec<Short>>>, AppError> {
    Ok(Json(ApiResponse::success(inner.service.list_shorts(&filter).await?)))
}

#[tracing::instrument(name = "Get short", skip(inner))]
pub async fn get_short(State(inner): State<InnerState>, Path(id): Path<Uuid>) -> ShortResponse {
    Ok(Json(ApiResponse::success(inner.service.short(id).await?)))
}

pub async fn retain(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> ShortResponse {
    Ok(Json(ApiResponse::success(inner.service.retain(&actor, id).await?)))
}

pub async fn reject(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> ShortResponse {
    Ok(Json(ApiResponse::success(inner.service.reject(&actor, id).await?)))
}

pub async fn assign(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignShort>,
) -> ShortResponse {
    Ok(Json(ApiResponse::success(
        inner.service.assign(&actor, id, payload).await?,
    )))
}

pub async fn reassign(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReassignPayload>,
) -> ShortResponse {
    Ok(Json(ApiResponse::success(
        inner.service.reassign(&actor, id, payload.videaste_id).await?,
    )))
}

pub async fn start(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> ShortResponse {
    Ok(Json(ApiResponse::success(inner.service.start(&actor, id).await?)))
}

pub async fn complete(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompletePayload>,
) -> ShortResponse {
    Ok(Json(ApiResponse::success(
        inner.service.complete(&actor, id, &payload.artifact_url).await?,
    )))
}

pub async fn validate(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> ShortResponse {
    Ok(Json(ApiResponse::success(inner.service.validate(&actor, id).await?)))
}

pub async fn reject_back(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FeedbackPayload>,
) -> ShortResponse {
    Ok(Json(ApiResponse::success(
        inner.service.reject_back(&actor, id, &payload.feedback).await?,
    )))
}

pub async fn publish(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> ShortResponse {
    Ok(Json(ApiResponse::success(inner.service.publish(&actor, id).await?)))
}

#[tracing::instrument(name = "Comment handler", skip(inner, actor, payload))]
pub async fn add_comment(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentPayload>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>), AppError> {
    let comment = inner.service.add_comment(&actor, id, &payload.body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}
