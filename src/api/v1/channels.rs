use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::api::common::ApiResponse;
use crate::domain::content_type::compatible_targets;
use crate::domain::{AdminChannel, ContentType, Short, SourceChannel, User};
use crate::errors::AppError;
use crate::service::{NewAdminChannel, NewSourceChannel};
use crate::InnerState;

#[tracing::instrument(name = "Compatible targets")]
pub async fn compatible_target_types(
    Path(content_type): Path<String>,
) -> Result<Json<ApiResponse<Vec<ContentType>>>, AppError> {
    let source: ContentType = content_type.parse()?;
    Ok(Json(ApiResponse::success(
        compatible_targets(source).into_iter().collect(),
    )))
}

#[tracing::instrument(name = "Create source channel handler", skip(inner, actor, payload))]
pub async fn create_source_channel(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Json(payload): Json<NewSourceChannel>,
) -> Result<(StatusCode, Json<ApiResponse<SourceChannel>>), AppError> {
    let channel = inner.service.create_source_channel(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(channel))))
}

#[tracing::instrument(name = "List source channels", skip(inner))]
pub async fn all_source_channels(
    State(inner): State<InnerState>,
) -> Result<Json<ApiResponse<Vec<SourceChannel>>>, AppError> {
    Ok(Json(ApiResponse::success(
        inner.service.list_source_channels().await?,
    )))
}

#[tracing::instrument(name = "Get source channel", skip(inner))]
pub async fn get_source_channel(
    State(inner): State<InnerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SourceChannel>>, AppError> {
    Ok(Json(ApiResponse::success(inner.service.source_channel(id).await?)))
}

#[tracing::instrument(name = "Delete source channel handler", skip(inner, actor))]
pub async fn delete_source_channel(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    inner.service.delete_source_channel(&actor, id).await?;
    Ok(Json(ApiResponse::with_message(id, "Source channel deleted")))
}

#[tracing::instrument(name = "Source channel history", skip(inner))]
pub async fn source_channel_shorts(
    State(inner): State<InnerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Short>>>, AppError> {
    Ok(Json(ApiResponse::success(inner.service.source_history(id).await?)))
}

#[tracing::instrument(name = "Roll handler", skip(inner, actor))]
pub async fn roll(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Short>>), AppError> {
    let short = inner.service.roll(&actor, id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(short))))
}

#[tracing::instrument(name = "Create publication channel handler", skip(inner, actor, payload))]
pub async fn create_admin_channel(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
    Json(payload): Json<NewAdminChannel>,
) -> Result<(StatusCode, Json<ApiResponse<AdminChannel>>), AppError> {
    let channel = inner.service.create_admin_channel(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(channel))))
}

#[tracing::instrument(name = "List publication channels", skip(inner))]
pub async fn all_admin_channels(
    State(inner): State<InnerState>,
) -> Result<Json<ApiResponse<Vec<AdminChannel>>>, AppError> {
    Ok(Json(ApiResponse::success(
        inner.service.list_admin_channels().await?,
    )))
}

#[tracing::instrument(name = "Get publication channel", skip(inner))]
pub async fn get_admin_channel(
    State(inner): State<InnerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AdminChannel>>, AppError> {
    Ok(Json(ApiResponse::success(inner.service.admin_channel(id).await?)))
}

#[tracing::instrument(name = "Compatible sources", skip(inner))]
pub async fn compatible_sources(
    State(inner): State<InnerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<SourceChannel>>>, AppError> {
    Ok(Json(ApiResponse::success(
        inner.service.compatible_sources(id).await?,
    )))
}
