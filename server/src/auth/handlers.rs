//! Authentication Handlers

use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::middleware::AuthUser;
use crate::permissions::GlobalRole;

/// Current user profile.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub global_role: GlobalRole,
}

/// Get current user profile.
///
/// GET /auth/me
#[tracing::instrument(skip(auth_user), fields(user_id = %auth_user.id))]
pub async fn get_profile(auth_user: AuthUser) -> Json<UserProfile> {
    Json(UserProfile {
        id: auth_user.id,
        display_name: auth_user.display_name,
        email: auth_user.email,
        global_role: auth_user.global_role,
    })
}
