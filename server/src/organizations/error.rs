//! Organization Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::permissions::PermissionError;

#[derive(Debug, thiserror::Error)]
pub enum OrganizationError {
    #[error("Organization not found")]
    NotFound,

    #[error("Member not found")]
    MemberNotFound,

    #[error("Slug is already taken")]
    SlugTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<validator::ValidationErrors> for OrganizationError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for OrganizationError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Permission(PermissionError::NotFound) | Self::NotFound => (
                StatusCode::NOT_FOUND,
                "ORGANIZATION_NOT_FOUND",
                "Organization not found".to_string(),
            ),
            Self::Permission(e) => return e.into_response(),
            Self::MemberNotFound => (
                StatusCode::NOT_FOUND,
                "MEMBER_NOT_FOUND",
                "Member not found".to_string(),
            ),
            Self::SlugTaken => (
                StatusCode::CONFLICT,
                "SLUG_TAKEN",
                "Slug is already taken".to_string(),
            ),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            Self::Database(err) => {
                tracing::error!(%err, "Organization endpoint database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Database error".to_string(),
                )
            }
        };

        (
            status,
            Json(serde_json::json!({ "error": code, "message": message })),
        )
            .into_response()
    }
}

/// Map a unique violation on the slug index to `SlugTaken`.
pub(super) fn map_slug_conflict(err: sqlx::Error) -> OrganizationError {
    match &err {
        sqlx::Error::Database(db) if db.constraint() == Some("organizations_slug_key") => {
            OrganizationError::SlugTaken
        }
        _ => OrganizationError::Database(err),
    }
}
