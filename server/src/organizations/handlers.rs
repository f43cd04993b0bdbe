//! Organization Management Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::error::{map_slug_conflict, OrganizationError};
use super::types::{
    ChangeRoleRequest, CreateOrganizationRequest, Organization, OrganizationWithRole,
    UpdateOrganizationRequest,
};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::permissions::membership::{
    next_org_status, request_org_membership, OrgMembershipEvent,
};
use crate::permissions::{
    load_organization_context, queries, require_organization_action, Action,
    OrgMembershipStatus, OrgRole, OrganizationMember, OrganizationMemberInfo, PermissionError,
};

const ORGANIZATION_COLUMNS: &str =
    "id, name, slug, description, visibility, join_mode, is_active, created_by, created_at, updated_at";

async fn fetch_organization(
    conn: &mut sqlx::PgConnection,
    organization_id: Uuid,
) -> Result<Organization, OrganizationError> {
    sqlx::query_as::<_, Organization>(&format!(
        "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"
    ))
    .bind(organization_id)
    .fetch_optional(conn)
    .await?
    .ok_or(OrganizationError::NotFound)
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new organization. The creator becomes its owner.
///
/// POST /api/organizations
#[tracing::instrument(skip(state))]
pub async fn create_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<Organization>), OrganizationError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    let organization = sqlx::query_as::<_, Organization>(&format!(
        r"INSERT INTO organizations (id, name, slug, description, visibility, join_mode, created_by)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           RETURNING {ORGANIZATION_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(&body.name)
    .bind(&body.slug)
    .bind(&body.description)
    .bind(body.visibility)
    .bind(body.join_mode)
    .bind(auth.id)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_slug_conflict)?;

    queries::insert_org_membership(
        &mut *tx,
        organization.id,
        auth.id,
        OrgRole::Owner,
        OrgMembershipStatus::Active,
    )
    .await?;

    tx.commit().await?;

    info!(
        organization_id = %organization.id,
        owner_id = %auth.id,
        "Organization created"
    );

    Ok((StatusCode::CREATED, Json(organization)))
}

/// List organizations the current user is an active member of.
///
/// GET /api/organizations/mine
#[tracing::instrument(skip(state))]
pub async fn list_my_organizations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<OrganizationWithRole>>, OrganizationError> {
    let organizations = sqlx::query_as::<_, OrganizationWithRole>(
        r"
        SELECT o.id, o.name, o.slug, o.description, o.visibility, o.join_mode, o.is_active,
               o.created_by, o.created_at, o.updated_at,
               m.role,
               (SELECT COUNT(*) FROM organization_memberships c
                 WHERE c.organization_id = o.id AND c.status = 'active') AS member_count
        FROM organizations o
        INNER JOIN organization_memberships m ON m.organization_id = o.id
        WHERE m.user_id = $1 AND m.status = 'active'
        ORDER BY o.name ASC
        ",
    )
    .bind(auth.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(organizations))
}

/// Get organization details.
///
/// GET /api/organizations/{org_id}
#[tracing::instrument(skip(state))]
pub async fn get_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Organization>, OrganizationError> {
    let mut conn = state.db.acquire().await?;

    require_organization_action(&mut conn, auth.actor(), org_id, Action::ViewOrganization)
        .await?;

    let organization = fetch_organization(&mut conn, org_id).await?;

    Ok(Json(organization))
}

/// Update organization settings (admin and above).
///
/// PATCH /api/organizations/{org_id}
#[tracing::instrument(skip(state))]
pub async fn update_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(body): Json<UpdateOrganizationRequest>,
) -> Result<Json<Organization>, OrganizationError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    require_organization_action(&mut tx, auth.actor(), org_id, Action::UpdateOrganization)
        .await?;

    let organization = sqlx::query_as::<_, Organization>(&format!(
        r"UPDATE organizations
           SET name = COALESCE($2, name),
               slug = COALESCE($3, slug),
               description = COALESCE($4, description),
               visibility = COALESCE($5, visibility),
               join_mode = COALESCE($6, join_mode),
               is_active = COALESCE($7, is_active),
               updated_at = NOW()
           WHERE id = $1
           RETURNING {ORGANIZATION_COLUMNS}"
    ))
    .bind(org_id)
    .bind(&body.name)
    .bind(&body.slug)
    .bind(&body.description)
    .bind(body.visibility)
    .bind(body.join_mode)
    .bind(body.is_active)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_slug_conflict)?;

    tx.commit().await?;

    info!(organization_id = %org_id, updated_by = %auth.id, "Organization updated");

    Ok(Json(organization))
}

/// Ask to join an organization.
///
/// Open organizations accept immediately; approval organizations leave the
/// request pending.
///
/// POST /api/organizations/{org_id}/join
#[tracing::instrument(skip(state))]
pub async fn join_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
) -> Result<(StatusCode, Json<OrganizationMember>), OrganizationError> {
    let mut tx = state.db.begin().await?;

    queries::lock_organization(&mut *tx, org_id).await?;
    let ctx = load_organization_context(&mut tx, auth.actor(), org_id)
        .await?
        .ok_or(OrganizationError::NotFound)?;
    ctx.require(&Action::JoinOrganization)?;

    let organization = fetch_organization(&mut tx, org_id).await?;
    let existing = ctx.org_membership.map(|m| m.status);

    let status = request_org_membership(organization.is_active, organization.join_mode, existing)?;

    let membership =
        queries::insert_org_membership(&mut *tx, org_id, auth.id, OrgRole::Member, status).await?;

    tx.commit().await?;

    info!(
        organization_id = %org_id,
        user_id = %auth.id,
        from = "none",
        event = OrgMembershipEvent::Request.as_str(),
        to = status.as_str(),
        "Organization membership transition"
    );

    Ok((StatusCode::CREATED, Json(membership)))
}

/// List members of an organization.
///
/// GET /api/organizations/{org_id}/members
#[tracing::instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Vec<OrganizationMemberInfo>>, OrganizationError> {
    let mut conn = state.db.acquire().await?;

    require_organization_action(&mut conn, auth.actor(), org_id, Action::ListMembers).await?;

    let members = queries::list_org_members(&mut *conn, org_id).await?;

    Ok(Json(members))
}

/// Approve a pending member (admin and above).
///
/// POST /api/organizations/{org_id}/members/{user_id}/approve
#[tracing::instrument(skip(state))]
pub async fn approve_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OrganizationMember>, OrganizationError> {
    let mut tx = state.db.begin().await?;

    require_organization_action(&mut tx, auth.actor(), org_id, Action::ApproveMembership).await?;

    let target = queries::get_org_member(&mut *tx, org_id, user_id)
        .await?
        .ok_or(OrganizationError::MemberNotFound)?;

    let next = next_org_status(Some(target.status), OrgMembershipEvent::Approve)?;

    let membership = queries::approve_org_membership(&mut *tx, org_id, user_id, auth.id).await?;

    tx.commit().await?;

    info!(
        organization_id = %org_id,
        user_id = %user_id,
        approved_by = %auth.id,
        from = target.status.as_str(),
        event = OrgMembershipEvent::Approve.as_str(),
        to = next.as_str(),
        "Organization membership transition"
    );

    Ok(Json(membership))
}

/// Change a member's role (admin and above; never the owner's).
///
/// PATCH /api/organizations/{org_id}/members/{user_id}/role
#[tracing::instrument(skip(state))]
pub async fn change_member_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ChangeRoleRequest>,
) -> Result<Json<OrganizationMember>, OrganizationError> {
    let mut tx = state.db.begin().await?;

    let ctx = load_organization_context(&mut tx, auth.actor(), org_id)
        .await?
        .ok_or(OrganizationError::NotFound)?;

    // Outsiders learn nothing about who is in the organization.
    if ctx.active_org_role().is_none() {
        return Err(PermissionError::NotAMember.into());
    }

    let target = queries::get_org_member(&mut *tx, org_id, user_id)
        .await?
        .ok_or(OrganizationError::MemberNotFound)?;

    ctx.require(&Action::ChangeMemberRole {
        current: target.role,
        new: body.role,
    })?;

    let membership = queries::update_org_member_role(&mut *tx, org_id, user_id, body.role).await?;

    tx.commit().await?;

    info!(
        organization_id = %org_id,
        user_id = %user_id,
        changed_by = %auth.id,
        from = target.role.as_str(),
        to = body.role.as_str(),
        "Organization role changed"
    );

    Ok(Json(membership))
}
