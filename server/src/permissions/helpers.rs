//! Permission helper functions for API handlers.
//!
//! Loads the actor's memberships for a resource into an [`AccessContext`]
//! and runs the authorization check in one call. Loaders take a connection
//! rather than the pool so the snapshot and the mutation that follows share
//! one transaction.

use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use super::membership::{CampaignMembershipStatus, OrgMembershipStatus};
use super::models::{Actor, CampaignAccess, OrgMembershipSnapshot};
use super::queries;
use super::resolver::{authorize, Action, Decision, PermissionError};
use super::roles::OrgRole;

/// Snapshot of everything the engine needs to decide an action.
///
/// Built once per request so every check in that request sees the same
/// membership state.
#[derive(Debug, Clone)]
pub struct AccessContext {
    pub actor: Actor,

    /// Organization the resource lives in, if any.
    pub organization_id: Option<Uuid>,

    /// Actor's membership in that organization.
    pub org_membership: Option<OrgMembershipSnapshot>,

    /// Campaign the resource lives in, if any.
    pub campaign: Option<CampaignAccess>,

    /// Actor's membership status in that campaign.
    pub campaign_membership: Option<CampaignMembershipStatus>,
}

impl AccessContext {
    /// Context with no resource attached, for global actions.
    #[must_use]
    pub const fn for_actor(actor: Actor) -> Self {
        Self {
            actor,
            organization_id: None,
            org_membership: None,
            campaign: None,
            campaign_membership: None,
        }
    }

    /// Actor's organization role, only if the membership is active.
    #[must_use]
    pub fn active_org_role(&self) -> Option<OrgRole> {
        self.org_membership
            .filter(|m| m.status == OrgMembershipStatus::Active)
            .map(|m| m.role)
    }

    /// Whether the actor is the GM of the campaign in context.
    #[must_use]
    pub fn is_gm(&self) -> bool {
        self.campaign.is_some_and(|c| c.gm_id == self.actor.id)
    }

    #[must_use]
    pub fn is_active_player(&self) -> bool {
        self.campaign_membership == Some(CampaignMembershipStatus::Active)
    }

    #[must_use]
    pub fn authorize(&self, action: &Action) -> Decision {
        authorize(self, action)
    }

    /// Authorize and log the denial, if any.
    pub fn require(&self, action: &Action) -> Result<(), PermissionError> {
        match self.authorize(action) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                debug!(
                    actor_id = %self.actor.id,
                    organization_id = ?self.organization_id,
                    action = action.action_name(),
                    reason = reason.code(),
                    "Authorization denied"
                );
                Err(reason)
            }
        }
    }

    /// The campaign in context. Only valid on contexts built by
    /// [`load_campaign_context`].
    pub fn campaign(&self) -> Result<&CampaignAccess, PermissionError> {
        self.campaign.as_ref().ok_or(PermissionError::NotFound)
    }
}

/// Load the actor's view of an organization.
///
/// Returns `None` if the organization does not exist.
#[tracing::instrument(skip(conn))]
pub async fn load_organization_context(
    conn: &mut PgConnection,
    actor: Actor,
    organization_id: Uuid,
) -> sqlx::Result<Option<AccessContext>> {
    if !queries::organization_exists(&mut *conn, organization_id).await? {
        return Ok(None);
    }

    let org_membership =
        queries::get_org_membership(&mut *conn, organization_id, actor.id).await?;

    Ok(Some(AccessContext {
        actor,
        organization_id: Some(organization_id),
        org_membership,
        campaign: None,
        campaign_membership: None,
    }))
}

/// Load the actor's view of a campaign and its organization.
///
/// Returns `None` if the campaign does not exist.
#[tracing::instrument(skip(conn))]
pub async fn load_campaign_context(
    conn: &mut PgConnection,
    actor: Actor,
    campaign_id: Uuid,
) -> sqlx::Result<Option<AccessContext>> {
    let Some(campaign) = queries::get_campaign_access(&mut *conn, campaign_id).await? else {
        return Ok(None);
    };

    let org_membership =
        queries::get_org_membership(&mut *conn, campaign.organization_id, actor.id).await?;
    let campaign_membership = queries::get_campaign_membership(&mut *conn, campaign_id, actor.id)
        .await?
        .map(|m| m.status);

    Ok(Some(AccessContext {
        actor,
        organization_id: Some(campaign.organization_id),
        org_membership,
        campaign: Some(campaign),
        campaign_membership,
    }))
}

/// Load organization context and require `action`.
///
/// Errors with `NotFound` if the organization does not exist, or with the
/// denial reason.
#[tracing::instrument(skip(conn))]
pub async fn require_organization_action(
    conn: &mut PgConnection,
    actor: Actor,
    organization_id: Uuid,
    action: Action,
) -> Result<AccessContext, PermissionError> {
    let ctx = load_organization_context(conn, actor, organization_id)
        .await?
        .ok_or(PermissionError::NotFound)?;

    ctx.require(&action)?;

    Ok(ctx)
}

/// Load campaign context and require `action`.
#[tracing::instrument(skip(conn))]
pub async fn require_campaign_action(
    conn: &mut PgConnection,
    actor: Actor,
    campaign_id: Uuid,
    action: Action,
) -> Result<AccessContext, PermissionError> {
    let ctx = load_campaign_context(conn, actor, campaign_id)
        .await?
        .ok_or(PermissionError::NotFound)?;

    ctx.require(&action)?;

    Ok(ctx)
}
