//! Admin module types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::ErrorResponse;
use crate::permissions::{GlobalRole, PermissionError, SystemPermission};

/// Admin API error type.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Resource not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    /// Permission error.
    #[error(transparent)]
    Permission(#[from] PermissionError),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            Self::Permission(e) => return e.into_response(),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Database(ref err) => {
                tracing::error!(%err, "Admin endpoint database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        (status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
    }
}

/// Whether the caller holds the global admin role, and what it unlocks.
#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub is_admin: bool,
    pub permissions: Vec<SystemPermission>,
}

#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    pub user_id: Uuid,
    pub global_role: GlobalRole,
}
