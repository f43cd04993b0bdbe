//! Campaign Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::permissions::PermissionError;

#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    #[error("Campaign not found")]
    NotFound,

    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("Character not found")]
    CharacterNotFound,

    #[error("Item not found")]
    ItemNotFound,

    #[error("Board element not found")]
    ElementNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<validator::ValidationErrors> for CampaignError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl CampaignError {
    /// For checks scoped to the organization rather than a campaign.
    pub(super) fn from_org_scope(err: PermissionError) -> Self {
        match err {
            PermissionError::NotFound => Self::OrganizationNotFound,
            other => Self::Permission(other),
        }
    }
}

impl IntoResponse for CampaignError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Permission(PermissionError::NotFound) | Self::NotFound => (
                StatusCode::NOT_FOUND,
                "CAMPAIGN_NOT_FOUND",
                "Campaign not found".to_string(),
            ),
            Self::OrganizationNotFound => (
                StatusCode::NOT_FOUND,
                "ORGANIZATION_NOT_FOUND",
                "Organization not found".to_string(),
            ),
            Self::Permission(e) => return e.into_response(),
            Self::CharacterNotFound => (
                StatusCode::NOT_FOUND,
                "CHARACTER_NOT_FOUND",
                "Character not found".to_string(),
            ),
            Self::ItemNotFound => (
                StatusCode::NOT_FOUND,
                "ITEM_NOT_FOUND",
                "Item not found".to_string(),
            ),
            Self::ElementNotFound => (
                StatusCode::NOT_FOUND,
                "ELEMENT_NOT_FOUND",
                "Board element not found".to_string(),
            ),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            Self::Database(err) => {
                tracing::error!(%err, "Campaign endpoint database error");
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
