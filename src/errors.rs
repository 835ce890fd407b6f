use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error as StdError;
use uuid::Uuid;

use crate::domain::{ContentType, ShortAction, ShortStatus};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Cannot {action} a short in state {from}")]
    InvalidTransition {
        from: ShortStatus,
        action: ShortAction,
    },

    #[error("{source_type} shorts cannot be published on a {target_type} channel")]
    IncompatibleContentType {
        source_type: ContentType,
        target_type: ContentType,
    },

    #[error("Invalid actor role: {0}")]
    InvalidActorRole(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("No eligible videos left to roll for source channel {source_channel_id}")]
    NoEligibleVideos { source_channel_id: Uuid },

    #[error("Video catalog unavailable: {0}")]
    CatalogUnavailable(#[source] anyhow::Error),

    #[error("Invalid deadline: {0}")]
    InvalidDeadline(String),

    #[error("Authentication failed: {0}")]
    Authentication(#[source] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict error: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable name of the error, never localized.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidTransition { .. } => "InvalidTransition",
            AppError::IncompatibleContentType { .. } => "IncompatibleContentType",
            AppError::InvalidActorRole(_) => "InvalidActorRole",
            AppError::InvalidState(_) => "InvalidState",
            AppError::NoEligibleVideos { .. } => "NoEligibleVideos",
            AppError::CatalogUnavailable(_) => "CatalogUnavailable",
            AppError::InvalidDeadline(_) => "InvalidDeadline",
            AppError::Authentication(_) => "Authentication",
            AppError::Database(_) => "Database",
            AppError::Validation(_) => "Validation",
            AppError::Conflict(_) => "Conflict",
            AppError::NotFound(_) => "NotFound",
            AppError::Unexpected(_) => "Unexpected",
        }
    }

    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::CatalogUnavailable(_) | AppError::NoEligibleVideos { .. }
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidTransition { .. } | AppError::InvalidState(_) | AppError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            AppError::IncompatibleContentType { .. }
            | AppError::InvalidDeadline(_)
            | AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidActorRole(_) => StatusCode::FORBIDDEN,
            AppError::NoEligibleVideos { .. } | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CatalogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                error_kind = kind,
                error_message = %message,
                status_code = %status,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_kind = kind,
                error_message = %message,
                status_code = %status,
                "Request rejected"
            );
        }

        if let AppError::Unexpected(e) | AppError::Database(e) | AppError::CatalogUnavailable(e) = &self {
            let mut source_chain = String::new();
            let mut current_err: Option<&(dyn StdError + 'static)> = e.source();
            while let Some(err) = current_err {
                source_chain.push_str(&format!("\n  Caused by: {}", err));
                current_err = err.source();
            }
            if !source_chain.is_empty() {
                tracing::error!("{} source chain:{}", kind, source_chain);
            }
        }

        let body = Json(json!({
            "kind": kind,
            "message": message,
            "status": status.as_u16(),
            "retryable": self.is_retryable(),
        }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            _ => AppError::Database(anyhow::Error::new(err).context("SQLx operation failed")),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(anyhow::Error::new(err).context("Schema migration failed"))
    }
}

/// Catalog calls are the only outbound HTTP, so transport failures surface as
/// `CatalogUnavailable`.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let error_type = match &err {
            e if e.is_timeout() => "Request Timeout",
            e if e.is_connect() => "Connection Failed",
            e if e.is_decode() => "Response Decode Failed",
            e if e.is_status() => "Error Status",
            _ => "Unknown HTTP Error",
        };

        tracing::error!(
            error = %err,
            url = ?err.url().map(|u| u.path().to_string()),
            status = ?err.status(),
            error_type,
            "Catalog request failed"
        );

        AppError::CatalogUnavailable(
            anyhow::Error::new(err).context(format!("YouTube request failed - {}", error_type)),
        )
    }
}
