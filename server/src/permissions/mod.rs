//! Authorization and visibility engine.
//!
//! Three independent scopes feed one decision:
//! - Global role: platform-level admin actions
//! - Organization role: per-organization rank and capabilities
//! - Campaign GM identity and campaign membership
//!
//! Membership and campaign status changes go through the transition tables in
//! [`membership`], and board reads are trimmed per viewer by [`visibility`].

pub mod helpers;
pub mod membership;
pub mod models;
pub mod queries;
pub mod resolver;
pub mod roles;
pub mod system;
pub mod visibility;

pub use helpers::{
    load_campaign_context, load_organization_context, require_campaign_action,
    require_organization_action, AccessContext,
};
pub use membership::{
    CampaignMembershipEvent, CampaignMembershipStatus, CampaignStatus, OrgJoinMode,
    OrgMembershipStatus,
};
pub use models::*;
pub use resolver::{authorize, Action, Decision, PermissionError};
pub use roles::{OrgCapabilities, OrgRole};
pub use system::{GlobalRole, SystemPermission};
pub use visibility::{filter_elements, Viewer, VisibilityRule};
