//! Global admin handlers.
//!
//! Platform-wide actions gated on the global admin role alone. Membership in
//! the target organization plays no part.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use super::types::{AdminError, AdminStatus, PromoteResponse};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::set_global_role;
use crate::permissions::{AccessContext, Action, GlobalRole, SystemPermission};

/// Check whether the current user is a global admin.
///
/// `GET /api/admin/status`
#[tracing::instrument(skip(auth), fields(user_id = %auth.id))]
pub async fn get_admin_status(auth: AuthUser) -> Json<AdminStatus> {
    let ctx = AccessContext::for_actor(auth.actor());
    let permissions: Vec<SystemPermission> = SystemPermission::all()
        .iter()
        .copied()
        .filter(|&permission| ctx.authorize(&Action::from(permission)).is_allowed())
        .collect();

    Json(AdminStatus {
        is_admin: auth.global_role.is_admin(),
        permissions,
    })
}

/// Delete an organization with all its campaigns.
///
/// `DELETE /api/admin/organizations/{org_id}`
#[tracing::instrument(skip(state))]
pub async fn delete_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
) -> Result<StatusCode, AdminError> {
    AccessContext::for_actor(auth.actor()).require(&Action::DeleteOrganization)?;

    let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(org_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AdminError::NotFound("Organization"));
    }

    info!(organization_id = %org_id, admin_id = %auth.id, "Organization deleted by admin");

    Ok(StatusCode::NO_CONTENT)
}

/// Grant the global admin role to a user.
///
/// `POST /api/admin/users/{user_id}/promote`
#[tracing::instrument(skip(state))]
pub async fn promote_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PromoteResponse>, AdminError> {
    AccessContext::for_actor(auth.actor()).require(&Action::PromoteUser)?;

    let user = set_global_role(&state.db, user_id, GlobalRole::Admin)
        .await?
        .ok_or(AdminError::NotFound("User"))?;

    info!(user_id = %user.id, admin_id = %auth.id, "User promoted to global admin");

    Ok(Json(PromoteResponse {
        user_id: user.id,
        global_role: user.global_role,
    }))
}
