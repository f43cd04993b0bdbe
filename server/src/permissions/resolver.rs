//! Authorization decisions.
//!
//! [`authorize`] walks a fixed sequence of checks and stops at the first one
//! that applies to the action:
//! 1. Global admin actions need the global admin role
//! 2. Joining an organization needs nothing else
//! 3. Everything else needs an active membership in the organization
//! 4. Organization admin actions need the matching admin capability
//! 5. Campaign creation and joining need the matching org capability
//! 6. GM-only actions need the campaign's GM
//! 7. Own-character edits need ownership and an active campaign membership
//! 8. Campaign reads need the GM or an active campaign membership

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;
use uuid::Uuid;

use super::helpers::AccessContext;
use super::roles::{OrgCapabilities, OrgRole};
use super::system::SystemPermission;

/// Every operation the engine knows how to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Global
    DeleteOrganization,
    PromoteUser,

    // Organization
    JoinOrganization,
    ViewOrganization,
    ListMembers,
    UpdateOrganization,
    ApproveMembership,
    ChangeMemberRole { current: OrgRole, new: OrgRole },
    ListCampaigns,
    CreateCampaign,

    // Campaign
    ViewCampaign,
    JoinCampaign,
    UpdateCampaign,
    ApprovePlayer,
    KickPlayer,
    BanPlayer,

    // Characters and items
    ListCharacters,
    CreateCharacter,
    UpdateOwnCharacter { owner_id: Option<Uuid> },
    GmUpdateCharacter,
    AdjustGold,
    CreateItem,
    GiveItem,

    // Board
    ViewBoard,
    UpdateBoard,
    CreateElement,
    UpdateElement,
    DeleteElement,
}

/// Which rule of the ordered check applies to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionScope {
    Global(SystemPermission),
    OrganizationJoin,
    OrganizationRead,
    OrganizationAdmin(OrgCapabilities),
    OrganizationCapability(OrgCapabilities),
    GmOnly,
    OwnCharacter(Option<Uuid>),
    CampaignParticipant,
}

impl From<SystemPermission> for Action {
    fn from(permission: SystemPermission) -> Self {
        match permission {
            SystemPermission::DeleteOrganization => Self::DeleteOrganization,
            SystemPermission::PromoteUser => Self::PromoteUser,
        }
    }
}

impl Action {
    #[must_use]
    pub const fn scope(&self) -> ActionScope {
        match self {
            Self::DeleteOrganization => ActionScope::Global(SystemPermission::DeleteOrganization),
            Self::PromoteUser => ActionScope::Global(SystemPermission::PromoteUser),

            Self::JoinOrganization => ActionScope::OrganizationJoin,
            Self::ViewOrganization | Self::ListMembers | Self::ListCampaigns => {
                ActionScope::OrganizationRead
            }
            Self::UpdateOrganization => {
                ActionScope::OrganizationAdmin(OrgCapabilities::MANAGE_ORGANIZATION)
            }
            Self::ApproveMembership => {
                ActionScope::OrganizationAdmin(OrgCapabilities::APPROVE_MEMBERS)
            }
            Self::ChangeMemberRole { .. } => {
                ActionScope::OrganizationAdmin(OrgCapabilities::MANAGE_ROLES)
            }
            Self::CreateCampaign => {
                ActionScope::OrganizationCapability(OrgCapabilities::CREATE_CAMPAIGNS)
            }
            Self::JoinCampaign => {
                ActionScope::OrganizationCapability(OrgCapabilities::JOIN_CAMPAIGNS)
            }

            Self::UpdateCampaign
            | Self::ApprovePlayer
            | Self::KickPlayer
            | Self::BanPlayer
            | Self::GmUpdateCharacter
            | Self::AdjustGold
            | Self::CreateItem
            | Self::GiveItem
            | Self::UpdateBoard
            | Self::CreateElement
            | Self::UpdateElement
            | Self::DeleteElement => ActionScope::GmOnly,

            Self::UpdateOwnCharacter { owner_id } => ActionScope::OwnCharacter(*owner_id),

            Self::ViewCampaign | Self::ListCharacters | Self::CreateCharacter | Self::ViewBoard => {
                ActionScope::CampaignParticipant
            }
        }
    }

    /// Name used in log entries.
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::DeleteOrganization => "delete_organization",
            Self::PromoteUser => "promote_user",
            Self::JoinOrganization => "join_organization",
            Self::ViewOrganization => "view_organization",
            Self::ListMembers => "list_members",
            Self::UpdateOrganization => "update_organization",
            Self::ApproveMembership => "approve_membership",
            Self::ChangeMemberRole { .. } => "change_member_role",
            Self::ListCampaigns => "list_campaigns",
            Self::CreateCampaign => "create_campaign",
            Self::ViewCampaign => "view_campaign",
            Self::JoinCampaign => "join_campaign",
            Self::UpdateCampaign => "update_campaign",
            Self::ApprovePlayer => "approve_player",
            Self::KickPlayer => "kick_player",
            Self::BanPlayer => "ban_player",
            Self::ListCharacters => "list_characters",
            Self::CreateCharacter => "create_character",
            Self::UpdateOwnCharacter { .. } => "update_own_character",
            Self::GmUpdateCharacter => "gm_update_character",
            Self::AdjustGold => "adjust_gold",
            Self::CreateItem => "create_item",
            Self::GiveItem => "give_item",
            Self::ViewBoard => "view_board",
            Self::UpdateBoard => "update_board",
            Self::CreateElement => "create_element",
            Self::UpdateElement => "update_element",
            Self::DeleteElement => "delete_element",
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Decision {
    Allow,
    Deny(PermissionError),
}

impl Decision {
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub const fn reason(&self) -> Option<&PermissionError> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<(), PermissionError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }
}

/// Decide whether the actor in `ctx` may perform `action`.
pub fn authorize(ctx: &AccessContext, action: &Action) -> Decision {
    let scope = action.scope();

    match scope {
        ActionScope::Global(permission) => {
            if ctx.actor.global_role.is_admin() {
                return Decision::Allow;
            }
            debug!(
                actor_id = %ctx.actor.id,
                permission = permission.action_name(),
                "Missing global permission"
            );
            return Decision::Deny(PermissionError::InsufficientGlobalRole);
        }
        ActionScope::OrganizationJoin => return Decision::Allow,
        _ => {}
    }

    let Some(role) = ctx.active_org_role() else {
        return Decision::Deny(PermissionError::NotAMember);
    };

    match scope {
        ActionScope::OrganizationAdmin(capability) => {
            if let Err(e) = require_capability(role, capability) {
                return Decision::Deny(e);
            }
            if let Action::ChangeMemberRole { current, new } = action {
                if current.is_protected() || new.is_protected() {
                    return Decision::Deny(PermissionError::OwnerRoleImmutable);
                }
            }
            Decision::Allow
        }
        ActionScope::OrganizationCapability(capability) => {
            if let Err(e) = require_capability(role, capability) {
                return Decision::Deny(e);
            }
            if matches!(action, Action::JoinCampaign) && ctx.is_gm() {
                return Decision::Deny(PermissionError::GmCannotJoin);
            }
            Decision::Allow
        }
        ActionScope::GmOnly => {
            if ctx.is_gm() {
                Decision::Allow
            } else {
                Decision::Deny(PermissionError::NotGm)
            }
        }
        ActionScope::OwnCharacter(owner_id) => {
            if owner_id != Some(ctx.actor.id) {
                Decision::Deny(PermissionError::NotOwnerOfResource)
            } else if ctx.is_active_player() {
                Decision::Allow
            } else {
                Decision::Deny(PermissionError::NotAMember)
            }
        }
        ActionScope::CampaignParticipant => {
            if ctx.is_gm() || ctx.is_active_player() {
                Decision::Allow
            } else {
                Decision::Deny(PermissionError::NotAMember)
            }
        }
        ActionScope::OrganizationRead
        | ActionScope::Global(_)
        | ActionScope::OrganizationJoin => Decision::Allow,
    }
}

fn require_capability(role: OrgRole, capability: OrgCapabilities) -> Result<(), PermissionError> {
    if role.capabilities().has(capability) {
        Ok(())
    } else {
        Err(PermissionError::InsufficientOrgRole {
            required: OrgCapabilities::minimum_role(capability),
        })
    }
}

/// Permission check errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// Action needs the global admin role.
    InsufficientGlobalRole,

    /// Actor has no active membership in the organization or campaign.
    NotAMember,

    /// Actor's organization role ranks too low.
    InsufficientOrgRole { required: OrgRole },

    /// Attempted to change the owner's role or to promote someone to owner.
    OwnerRoleImmutable,

    /// Action is reserved for the campaign's game master.
    NotGm,

    /// Resource belongs to someone else.
    NotOwnerOfResource,

    /// The state machine has no row for this move.
    InvalidStatusTransition {
        from: &'static str,
        event: &'static str,
    },

    /// Campaign already has its maximum number of active players.
    CampaignFull { max_players: i32 },

    /// Organization does not accept join requests.
    JoinNotAllowed,

    /// The GM runs the campaign and cannot take a player seat in it.
    GmCannotJoin,

    /// Organization is deactivated.
    OrganizationInactive,

    /// Organization or campaign not found.
    NotFound,

    /// Database error occurred.
    DatabaseError(String),
}

impl PermissionError {
    /// Stable machine-readable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientGlobalRole => "INSUFFICIENT_GLOBAL_ROLE",
            Self::NotAMember => "NOT_A_MEMBER",
            Self::InsufficientOrgRole { .. } => "INSUFFICIENT_ORG_ROLE",
            Self::OwnerRoleImmutable => "OWNER_ROLE_IMMUTABLE",
            Self::NotGm => "NOT_GM",
            Self::NotOwnerOfResource => "NOT_OWNER_OF_RESOURCE",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::CampaignFull { .. } => "CAMPAIGN_FULL",
            Self::JoinNotAllowed => "JOIN_NOT_ALLOWED",
            Self::GmCannotJoin => "GM_CANNOT_JOIN",
            Self::OrganizationInactive => "ORGANIZATION_INACTIVE",
            Self::NotFound => "NOT_FOUND",
            Self::DatabaseError(_) => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InsufficientGlobalRole
            | Self::NotAMember
            | Self::InsufficientOrgRole { .. }
            | Self::OwnerRoleImmutable
            | Self::NotGm
            | Self::NotOwnerOfResource
            | Self::JoinNotAllowed
            | Self::GmCannotJoin
            | Self::OrganizationInactive => StatusCode::FORBIDDEN,
            Self::InvalidStatusTransition { .. } | Self::CampaignFull { .. } => {
                StatusCode::CONFLICT
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for PermissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientGlobalRole => write!(f, "Global admin role required"),
            Self::NotAMember => write!(f, "Not an active member"),
            Self::InsufficientOrgRole { required } => {
                write!(f, "Organization role '{required}' or higher required")
            }
            Self::OwnerRoleImmutable => write!(f, "The owner role cannot be assigned or changed"),
            Self::NotGm => write!(f, "Only the game master can do this"),
            Self::NotOwnerOfResource => write!(f, "This resource belongs to someone else"),
            Self::InvalidStatusTransition { from, event } => {
                write!(f, "Cannot apply '{event}' to status '{from}'")
            }
            Self::CampaignFull { max_players } => {
                write!(f, "Campaign is full ({max_players} players)")
            }
            Self::JoinNotAllowed => write!(f, "This organization does not accept join requests"),
            Self::GmCannotJoin => write!(f, "The game master cannot join their own campaign"),
            Self::OrganizationInactive => write!(f, "Organization is inactive"),
            Self::NotFound => write!(f, "Not found"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
        }
    }
}

impl std::error::Error for PermissionError {}

impl From<sqlx::Error> for PermissionError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl IntoResponse for PermissionError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::DatabaseError(msg) => {
                tracing::error!(error = %msg, "Database error during authorization");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            self.status_code(),
            Json(serde_json::json!({ "error": self.code(), "message": message })),
        )
            .into_response()
    }
}
