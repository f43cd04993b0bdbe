//! Database queries for the permission system.
//!
//! Provides async functions for:
//! - Organization memberships (snapshot, join, approve, role change)
//! - Campaign access data and campaign memberships
//!
//! Every function accepts any Postgres executor so it can run on the pool or
//! inside a request transaction.

use sqlx::PgExecutor;
use uuid::Uuid;

use super::membership::{CampaignMembershipStatus, OrgMembershipStatus};
use super::models::{
    CampaignAccess, CampaignMember, OrgMembershipSnapshot, OrganizationMember,
    OrganizationMemberInfo,
};
use super::roles::OrgRole;
use crate::db::db_error;

// ============================================================================
// Organization Membership Queries
// ============================================================================

/// Check if an organization exists.
pub async fn organization_exists<'e, E>(executor: E, organization_id: Uuid) -> sqlx::Result<bool>
where
    E: PgExecutor<'e>,
{
    let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM organizations WHERE id = $1)")
        .bind(organization_id)
        .fetch_one(executor)
        .await
        .map_err(db_error!("organization_exists", organization_id = %organization_id))?;

    Ok(result.0)
}

/// Lock an organization row for the rest of the transaction.
///
/// Join takes this before reading the existing membership so two requests
/// from the same user cannot both see none.
pub async fn lock_organization<'e, E>(executor: E, organization_id: Uuid) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("SELECT 1 FROM organizations WHERE id = $1 FOR UPDATE")
        .bind(organization_id)
        .execute(executor)
        .await
        .map_err(db_error!("lock_organization", organization_id = %organization_id))?;

    Ok(())
}

/// Role and status of a user in an organization.
pub async fn get_org_membership<'e, E>(
    executor: E,
    organization_id: Uuid,
    user_id: Uuid,
) -> sqlx::Result<Option<OrgMembershipSnapshot>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, OrgMembershipSnapshot>(
        r"
        SELECT role, status
        FROM organization_memberships
        WHERE organization_id = $1 AND user_id = $2
        ",
    )
    .bind(organization_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(db_error!("get_org_membership", organization_id = %organization_id, user_id = %user_id))
}

/// Full membership row of a user in an organization.
pub async fn get_org_member<'e, E>(
    executor: E,
    organization_id: Uuid,
    user_id: Uuid,
) -> sqlx::Result<Option<OrganizationMember>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, OrganizationMember>(
        r"
        SELECT id, organization_id, user_id, role, status, joined_at, approved_by, approved_at
        FROM organization_memberships
        WHERE organization_id = $1 AND user_id = $2
        ",
    )
    .bind(organization_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(db_error!("get_org_member", organization_id = %organization_id, user_id = %user_id))
}

/// Insert a membership row.
pub async fn insert_org_membership<'e, E>(
    executor: E,
    organization_id: Uuid,
    user_id: Uuid,
    role: OrgRole,
    status: OrgMembershipStatus,
) -> sqlx::Result<OrganizationMember>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, OrganizationMember>(
        r"
        INSERT INTO organization_memberships (id, organization_id, user_id, role, status, approved_at)
        VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 = 'active'::org_membership_status THEN NOW() END)
        RETURNING id, organization_id, user_id, role, status, joined_at, approved_by, approved_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(organization_id)
    .bind(user_id)
    .bind(role)
    .bind(status)
    .fetch_one(executor)
    .await
    .map_err(db_error!("insert_org_membership", organization_id = %organization_id, user_id = %user_id))
}

/// Mark a membership active.
pub async fn approve_org_membership<'e, E>(
    executor: E,
    organization_id: Uuid,
    user_id: Uuid,
    approved_by: Uuid,
) -> sqlx::Result<OrganizationMember>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, OrganizationMember>(
        r"
        UPDATE organization_memberships
        SET status = 'active', approved_by = $3, approved_at = NOW()
        WHERE organization_id = $1 AND user_id = $2
        RETURNING id, organization_id, user_id, role, status, joined_at, approved_by, approved_at
        ",
    )
    .bind(organization_id)
    .bind(user_id)
    .bind(approved_by)
    .fetch_one(executor)
    .await
    .map_err(db_error!("approve_org_membership", organization_id = %organization_id, user_id = %user_id))
}

/// Change a member's role.
pub async fn update_org_member_role<'e, E>(
    executor: E,
    organization_id: Uuid,
    user_id: Uuid,
    role: OrgRole,
) -> sqlx::Result<OrganizationMember>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, OrganizationMember>(
        r"
        UPDATE organization_memberships
        SET role = $3
        WHERE organization_id = $1 AND user_id = $2
        RETURNING id, organization_id, user_id, role, status, joined_at, approved_by, approved_at
        ",
    )
    .bind(organization_id)
    .bind(user_id)
    .bind(role)
    .fetch_one(executor)
    .await
    .map_err(db_error!("update_org_member_role", organization_id = %organization_id, user_id = %user_id))
}

/// List members of an organization, highest role first.
pub async fn list_org_members<'e, E>(
    executor: E,
    organization_id: Uuid,
) -> sqlx::Result<Vec<OrganizationMemberInfo>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, OrganizationMemberInfo>(
        r"
        SELECT m.user_id, u.display_name, m.role, m.status, m.joined_at
        FROM organization_memberships m
        INNER JOIN users u ON u.id = m.user_id
        WHERE m.organization_id = $1
        ORDER BY m.role DESC, m.joined_at ASC
        ",
    )
    .bind(organization_id)
    .fetch_all(executor)
    .await
    .map_err(db_error!("list_org_members", organization_id = %organization_id))
}

// ============================================================================
// Campaign Membership Queries
// ============================================================================

/// Load the fields of a campaign the engine decides on.
pub async fn get_campaign_access<'e, E>(
    executor: E,
    campaign_id: Uuid,
) -> sqlx::Result<Option<CampaignAccess>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CampaignAccess>(
        r"
        SELECT id, organization_id, gm_id, status, max_players
        FROM campaigns
        WHERE id = $1
        ",
    )
    .bind(campaign_id)
    .fetch_optional(executor)
    .await
    .map_err(db_error!("get_campaign_access", campaign_id = %campaign_id))
}

/// Lock the campaign row for the rest of the transaction.
///
/// Join and approve take this before counting players so two requests cannot
/// both take the last seat.
pub async fn lock_campaign<'e, E>(executor: E, campaign_id: Uuid) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("SELECT 1 FROM campaigns WHERE id = $1 FOR UPDATE")
        .bind(campaign_id)
        .execute(executor)
        .await
        .map_err(db_error!("lock_campaign", campaign_id = %campaign_id))?;

    Ok(())
}

/// Membership row of a user in a campaign.
pub async fn get_campaign_membership<'e, E>(
    executor: E,
    campaign_id: Uuid,
    user_id: Uuid,
) -> sqlx::Result<Option<CampaignMember>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CampaignMember>(
        r"
        SELECT id, campaign_id, user_id, status, join_message, joined_at, approved_at, updated_at
        FROM campaign_memberships
        WHERE campaign_id = $1 AND user_id = $2
        ",
    )
    .bind(campaign_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(db_error!("get_campaign_membership", campaign_id = %campaign_id, user_id = %user_id))
}

/// Number of active players in a campaign.
pub async fn count_active_players<'e, E>(executor: E, campaign_id: Uuid) -> sqlx::Result<i64>
where
    E: PgExecutor<'e>,
{
    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM campaign_memberships WHERE campaign_id = $1 AND status = 'active'",
    )
    .bind(campaign_id)
    .fetch_one(executor)
    .await
    .map_err(db_error!("count_active_players", campaign_id = %campaign_id))?;

    Ok(result.0)
}

/// Record a join request, reusing the row left by an earlier kick.
pub async fn upsert_campaign_request<'e, E>(
    executor: E,
    campaign_id: Uuid,
    user_id: Uuid,
    status: CampaignMembershipStatus,
    join_message: Option<&str>,
) -> sqlx::Result<CampaignMember>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CampaignMember>(
        r"
        INSERT INTO campaign_memberships (id, campaign_id, user_id, status, join_message)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (campaign_id, user_id) DO UPDATE
        SET status = EXCLUDED.status,
            join_message = EXCLUDED.join_message,
            joined_at = NOW(),
            approved_at = NULL,
            updated_at = NOW()
        RETURNING id, campaign_id, user_id, status, join_message, joined_at, approved_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(campaign_id)
    .bind(user_id)
    .bind(status)
    .bind(join_message)
    .fetch_one(executor)
    .await
    .map_err(db_error!("upsert_campaign_request", campaign_id = %campaign_id, user_id = %user_id))
}

/// Move an existing campaign membership to `status`.
pub async fn set_campaign_membership_status<'e, E>(
    executor: E,
    campaign_id: Uuid,
    user_id: Uuid,
    status: CampaignMembershipStatus,
) -> sqlx::Result<CampaignMember>
where
    E: PgExecutor<'e>,
{
    let approved = status == CampaignMembershipStatus::Active;

    sqlx::query_as::<_, CampaignMember>(
        r"
        UPDATE campaign_memberships
        SET status = $3,
            approved_at = CASE WHEN $4 THEN NOW() ELSE approved_at END,
            updated_at = NOW()
        WHERE campaign_id = $1 AND user_id = $2
        RETURNING id, campaign_id, user_id, status, join_message, joined_at, approved_at, updated_at
        ",
    )
    .bind(campaign_id)
    .bind(user_id)
    .bind(status)
    .bind(approved)
    .fetch_one(executor)
    .await
    .map_err(db_error!("set_campaign_membership_status", campaign_id = %campaign_id, user_id = %user_id))
}

/// List members of a campaign.
pub async fn list_campaign_members<'e, E>(
    executor: E,
    campaign_id: Uuid,
) -> sqlx::Result<Vec<CampaignMember>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CampaignMember>(
        r"
        SELECT id, campaign_id, user_id, status, join_message, joined_at, approved_at, updated_at
        FROM campaign_memberships
        WHERE campaign_id = $1
        ORDER BY joined_at ASC
        ",
    )
    .bind(campaign_id)
    .fetch_all(executor)
    .await
    .map_err(db_error!("list_campaign_members", campaign_id = %campaign_id))
}
