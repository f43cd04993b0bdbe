//! Organization roles and the capabilities they grant.
//!
//! Roles are totally ordered by rank:
//! `guest (0) < member (1) < mj (2) < admin (3) < owner (4)`.
//!
//! Capabilities are cumulative: a role holds every capability of the roles
//! ranked below it. The engine checks capabilities, and the presets below are
//! laid out so that "has capability X" is the same as "rank >= the lowest role
//! granted X".

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A member's role inside one organization.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "org_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    /// Limited access: may look around but not take part in campaigns.
    Guest,
    /// Regular member, may join campaigns.
    #[default]
    Member,
    /// Game master, may create and run campaigns.
    Mj,
    /// Organization administrator.
    Admin,
    /// Founder of the organization. Exactly one per organization.
    Owner,
}

impl OrgRole {
    /// Numeric rank used for ordering.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Guest => 0,
            Self::Member => 1,
            Self::Mj => 2,
            Self::Admin => 3,
            Self::Owner => 4,
        }
    }

    /// Returns true if this role ranks at or above `other`.
    #[must_use]
    pub const fn at_least(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }

    /// Capabilities granted by this role.
    #[must_use]
    pub const fn capabilities(self) -> OrgCapabilities {
        match self {
            Self::Guest => OrgCapabilities::GUEST_DEFAULT,
            Self::Member => OrgCapabilities::MEMBER_DEFAULT,
            Self::Mj => OrgCapabilities::MJ_DEFAULT,
            Self::Admin => OrgCapabilities::ADMIN_DEFAULT,
            Self::Owner => OrgCapabilities::OWNER_DEFAULT,
        }
    }

    /// The owner role is assigned at creation and never changes hands.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(self, Self::Owner)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Member => "member",
            Self::Mj => "mj",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// All roles in ascending rank.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Guest, Self::Member, Self::Mj, Self::Admin, Self::Owner]
    }
}

impl PartialOrd for OrgRole {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrgRole {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Organization capabilities represented as a 32-bit bitfield.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct OrgCapabilities: u32 {
        // === Reading (bits 0-2) ===
        /// View organization details
        const VIEW_ORGANIZATION  = 1 << 0;
        /// List organization members
        const VIEW_MEMBERS       = 1 << 1;
        /// List and view campaigns of the organization
        const VIEW_CAMPAIGNS     = 1 << 2;

        // === Play (bit 3) ===
        /// Request to join a campaign as a player
        const JOIN_CAMPAIGNS     = 1 << 3;

        // === Game mastering (bit 4) ===
        /// Create a campaign and become its game master
        const CREATE_CAMPAIGNS   = 1 << 4;

        // === Administration (bits 5-7) ===
        /// Approve pending membership requests
        const APPROVE_MEMBERS    = 1 << 5;
        /// Change the role of non-owner members
        const MANAGE_ROLES       = 1 << 6;
        /// Update organization settings
        const MANAGE_ORGANIZATION = 1 << 7;
    }
}

impl OrgCapabilities {
    // === Preset Combinations ===

    /// Guests can look but not play.
    pub const GUEST_DEFAULT: Self = Self::VIEW_ORGANIZATION
        .union(Self::VIEW_MEMBERS)
        .union(Self::VIEW_CAMPAIGNS);

    pub const MEMBER_DEFAULT: Self = Self::GUEST_DEFAULT.union(Self::JOIN_CAMPAIGNS);

    pub const MJ_DEFAULT: Self = Self::MEMBER_DEFAULT.union(Self::CREATE_CAMPAIGNS);

    pub const ADMIN_DEFAULT: Self = Self::MJ_DEFAULT
        .union(Self::APPROVE_MEMBERS)
        .union(Self::MANAGE_ROLES)
        .union(Self::MANAGE_ORGANIZATION);

    pub const OWNER_DEFAULT: Self = Self::all();

    /// Check if these capabilities include all of `other`.
    #[must_use]
    pub const fn has(&self, other: Self) -> bool {
        self.contains(other)
    }

    /// Lowest role that holds `capability`.
    #[must_use]
    pub fn minimum_role(capability: Self) -> OrgRole {
        OrgRole::all()
            .iter()
            .copied()
            .find(|role| role.capabilities().has(capability))
            .unwrap_or(OrgRole::Owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        assert_eq!(OrgRole::Guest.rank(), 0);
        assert_eq!(OrgRole::Member.rank(), 1);
        assert_eq!(OrgRole::Mj.rank(), 2);
        assert_eq!(OrgRole::Admin.rank(), 3);
        assert_eq!(OrgRole::Owner.rank(), 4);
    }

    #[test]
    fn test_ord_follows_rank() {
        assert!(OrgRole::Guest < OrgRole::Member);
        assert!(OrgRole::Member < OrgRole::Mj);
        assert!(OrgRole::Mj < OrgRole::Admin);
        assert!(OrgRole::Admin < OrgRole::Owner);
        assert_eq!(OrgRole::all().iter().max(), Some(&OrgRole::Owner));
    }

    #[test]
    fn test_at_least() {
        assert!(OrgRole::Admin.at_least(OrgRole::Mj));
        assert!(OrgRole::Mj.at_least(OrgRole::Mj));
        assert!(!OrgRole::Member.at_least(OrgRole::Mj));
    }

    #[test]
    fn test_capabilities_are_cumulative() {
        let roles = OrgRole::all();
        for pair in roles.windows(2) {
            let lower = pair[0].capabilities();
            let higher = pair[1].capabilities();
            assert!(
                higher.has(lower),
                "{} should hold everything {} holds",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_capability_matches_rank_threshold() {
        let thresholds = [
            (OrgCapabilities::VIEW_ORGANIZATION, OrgRole::Guest),
            (OrgCapabilities::JOIN_CAMPAIGNS, OrgRole::Member),
            (OrgCapabilities::CREATE_CAMPAIGNS, OrgRole::Mj),
            (OrgCapabilities::APPROVE_MEMBERS, OrgRole::Admin),
            (OrgCapabilities::MANAGE_ROLES, OrgRole::Admin),
            (OrgCapabilities::MANAGE_ORGANIZATION, OrgRole::Admin),
        ];

        for (capability, threshold) in thresholds {
            assert_eq!(OrgCapabilities::minimum_role(capability), threshold);
            for role in OrgRole::all() {
                assert_eq!(
                    role.capabilities().has(capability),
                    role.at_least(threshold),
                    "{role} vs {capability:?}"
                );
            }
        }
    }

    #[test]
    fn test_guest_cannot_join_campaigns() {
        assert!(!OrgRole::Guest
            .capabilities()
            .has(OrgCapabilities::JOIN_CAMPAIGNS));
        assert!(OrgRole::Guest
            .capabilities()
            .has(OrgCapabilities::VIEW_CAMPAIGNS));
    }

    #[test]
    fn test_owner_has_everything() {
        assert_eq!(OrgRole::Owner.capabilities(), OrgCapabilities::all());
        assert!(OrgRole::Owner.is_protected());
        assert!(!OrgRole::Admin.is_protected());
    }

    #[test]
    fn test_default_role_is_member() {
        assert_eq!(OrgRole::default(), OrgRole::Member);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&OrgRole::Mj).unwrap(), "\"mj\"");
        let role: OrgRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, OrgRole::Admin);
    }

    #[test]
    fn test_capabilities_serialize_as_flag_names() {
        let caps = OrgCapabilities::VIEW_ORGANIZATION | OrgCapabilities::VIEW_MEMBERS;
        let json = serde_json::to_string(&caps).unwrap();
        assert_eq!(json, "\"VIEW_ORGANIZATION | VIEW_MEMBERS\"");
    }
}
