//! Global Admin Module
//!
//! Endpoints reserved to global admins:
//! - Delete any organization
//! - Promote a user to global admin
//!
//! `/status` is open to any authenticated user.

pub mod handlers;
pub mod types;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::api::AppState;

pub use types::AdminError;

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::get_admin_status))
        .route(
            "/organizations/{org_id}",
            delete(handlers::delete_organization),
        )
        .route("/users/{user_id}/promote", post(handlers::promote_user))
}
