//! Database models for the permission system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::membership::{CampaignMembershipStatus, CampaignStatus, OrgMembershipStatus};
use super::roles::OrgRole;
use super::system::GlobalRole;

/// Authenticated identity as seen by the authorization engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub global_role: GlobalRole,
}

impl Actor {
    #[must_use]
    pub const fn new(id: Uuid, global_role: GlobalRole) -> Self {
        Self { id, global_role }
    }
}

/// One (user, organization) membership row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrganizationMember {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: OrgRole,
    pub status: OrgMembershipStatus,
    pub joined_at: DateTime<Utc>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Organization member joined with the user's display name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrganizationMemberInfo {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: OrgRole,
    pub status: OrgMembershipStatus,
    pub joined_at: DateTime<Utc>,
}

/// One (user, campaign) membership row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CampaignMember {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub status: CampaignMembershipStatus,
    pub join_message: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// The slice of a campaign row the engine needs.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CampaignAccess {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub gm_id: Uuid,
    pub status: CampaignStatus,
    pub max_players: i32,
}

/// Role and status of the actor in one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct OrgMembershipSnapshot {
    pub role: OrgRole,
    pub status: OrgMembershipStatus,
}
