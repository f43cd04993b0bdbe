//! Membership and campaign lifecycle state machines.
//!
//! Every legal move is a row in one of the transition tables below. Anything
//! not listed is rejected with [`PermissionError::InvalidStatusTransition`],
//! so callers never mutate a status field without going through here.

use serde::{Deserialize, Serialize};

use super::resolver::PermissionError;

/// Label used for "no membership row yet".
const NONE: &str = "none";

// ============================================================================
// Organization membership
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "org_membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrgMembershipStatus {
    Pending,
    Active,
}

impl OrgMembershipStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgMembershipEvent {
    /// The actor asks to join.
    Request,
    /// An admin (or the open join mode) accepts the request.
    Approve,
}

impl OrgMembershipEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Approve => "approve",
        }
    }
}

/// How an organization accepts new members.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "org_join_mode", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrgJoinMode {
    /// Requests are accepted immediately.
    Open,
    /// Requests wait for an admin.
    #[default]
    Approval,
    /// Only invitations are accepted; plain requests are refused.
    InviteOnly,
    /// Nobody can join.
    Closed,
}

/// Apply `event` to an organization membership in state `current`.
pub fn next_org_status(
    current: Option<OrgMembershipStatus>,
    event: OrgMembershipEvent,
) -> Result<OrgMembershipStatus, PermissionError> {
    use OrgMembershipEvent as E;
    use OrgMembershipStatus as S;

    match (current, event) {
        (None, E::Request) => Ok(S::Pending),
        (Some(S::Pending), E::Approve) => Ok(S::Active),
        _ => Err(PermissionError::InvalidStatusTransition {
            from: current.map_or(NONE, S::as_str),
            event: event.as_str(),
        }),
    }
}

/// Resolve a join request against an organization.
///
/// Returns the status the new membership row should be stored with. Open
/// organizations run the approval step immediately.
pub fn request_org_membership(
    org_is_active: bool,
    join_mode: OrgJoinMode,
    existing: Option<OrgMembershipStatus>,
) -> Result<OrgMembershipStatus, PermissionError> {
    if !org_is_active {
        return Err(PermissionError::OrganizationInactive);
    }

    match join_mode {
        OrgJoinMode::Closed | OrgJoinMode::InviteOnly => Err(PermissionError::JoinNotAllowed),
        OrgJoinMode::Approval => next_org_status(existing, OrgMembershipEvent::Request),
        OrgJoinMode::Open => {
            let pending = next_org_status(existing, OrgMembershipEvent::Request)?;
            next_org_status(Some(pending), OrgMembershipEvent::Approve)
        }
    }
}

// ============================================================================
// Campaign membership
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "campaign_membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CampaignMembershipStatus {
    Pending,
    Active,
    Kicked,
    Banned,
}

impl CampaignMembershipStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Kicked => "kicked",
            Self::Banned => "banned",
        }
    }

    /// Banned is the only state nothing leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Banned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignMembershipEvent {
    Request,
    Approve,
    Kick,
    Ban,
}

impl CampaignMembershipEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Approve => "approve",
            Self::Kick => "kick",
            Self::Ban => "ban",
        }
    }
}

/// Apply `event` to a campaign membership in state `current`.
///
/// | from              | event   | to      |
/// |-------------------|---------|---------|
/// | none, kicked      | request | pending |
/// | pending           | approve | active  |
/// | pending, active   | kick    | kicked  |
/// | pending, active, kicked | ban | banned |
pub fn next_campaign_status(
    current: Option<CampaignMembershipStatus>,
    event: CampaignMembershipEvent,
) -> Result<CampaignMembershipStatus, PermissionError> {
    use CampaignMembershipEvent as E;
    use CampaignMembershipStatus as S;

    match (current, event) {
        (None | Some(S::Kicked), E::Request) => Ok(S::Pending),
        (Some(S::Pending), E::Approve) => Ok(S::Active),
        (Some(S::Pending | S::Active), E::Kick) => Ok(S::Kicked),
        (Some(S::Pending | S::Active | S::Kicked), E::Ban) => Ok(S::Banned),
        _ => Err(PermissionError::InvalidStatusTransition {
            from: current.map_or(NONE, S::as_str),
            event: event.as_str(),
        }),
    }
}

/// Resolve a join request against a campaign.
///
/// Checks, in order: the campaign accepts players, the membership table
/// allows a request from the current state, and a seat is free.
pub fn request_campaign_membership(
    campaign_status: CampaignStatus,
    existing: Option<CampaignMembershipStatus>,
    active_players: i64,
    max_players: i32,
) -> Result<CampaignMembershipStatus, PermissionError> {
    if !campaign_status.accepts_players() {
        return Err(PermissionError::InvalidStatusTransition {
            from: campaign_status.as_str(),
            event: "join_request",
        });
    }

    let next = next_campaign_status(existing, CampaignMembershipEvent::Request)?;

    if active_players >= i64::from(max_players) {
        return Err(PermissionError::CampaignFull { max_players });
    }

    Ok(next)
}

/// Approve a pending request, refusing if the table is already full.
pub fn approve_campaign_membership(
    current: Option<CampaignMembershipStatus>,
    active_players: i64,
    max_players: i32,
) -> Result<CampaignMembershipStatus, PermissionError> {
    let next = next_campaign_status(current, CampaignMembershipEvent::Approve)?;

    if active_players >= i64::from(max_players) {
        return Err(PermissionError::CampaignFull { max_players });
    }

    Ok(next)
}

// ============================================================================
// Campaign status
// ============================================================================

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "campaign_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Open,
    InProgress,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// New players are only taken while recruiting or playing.
    #[must_use]
    pub const fn accepts_players(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the status may move to `next`. Staying put is always allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use CampaignStatus as S;

        if self as u8 == next as u8 {
            return true;
        }

        matches!(
            (self, next),
            (S::Draft, S::Open | S::Cancelled)
                | (S::Open, S::Draft | S::InProgress | S::Cancelled)
                | (S::InProgress, S::Paused | S::Completed | S::Cancelled)
                | (S::Paused, S::InProgress | S::Completed | S::Cancelled)
        )
    }

    /// Validate a status change requested by the GM.
    pub fn transition_to(self, next: Self) -> Result<Self, PermissionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PermissionError::InvalidStatusTransition {
                from: self.as_str(),
                event: next.as_str(),
            })
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Draft,
            Self::Open,
            Self::InProgress,
            Self::Paused,
            Self::Completed,
            Self::Cancelled,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CampaignMembershipEvent as E;
    use CampaignMembershipStatus as S;

    // === Organization membership ===

    #[test]
    fn test_org_request_creates_pending() {
        assert_eq!(
            next_org_status(None, OrgMembershipEvent::Request),
            Ok(OrgMembershipStatus::Pending)
        );
    }

    #[test]
    fn test_org_approve_pending() {
        assert_eq!(
            next_org_status(Some(OrgMembershipStatus::Pending), OrgMembershipEvent::Approve),
            Ok(OrgMembershipStatus::Active)
        );
    }

    #[test]
    fn test_org_invalid_moves() {
        let invalid = [
            (None, OrgMembershipEvent::Approve),
            (Some(OrgMembershipStatus::Pending), OrgMembershipEvent::Request),
            (Some(OrgMembershipStatus::Active), OrgMembershipEvent::Request),
            (Some(OrgMembershipStatus::Active), OrgMembershipEvent::Approve),
        ];
        for (current, event) in invalid {
            assert!(
                matches!(
                    next_org_status(current, event),
                    Err(PermissionError::InvalidStatusTransition { .. })
                ),
                "{current:?} + {event:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_org_join_modes() {
        assert_eq!(
            request_org_membership(true, OrgJoinMode::Open, None),
            Ok(OrgMembershipStatus::Active)
        );
        assert_eq!(
            request_org_membership(true, OrgJoinMode::Approval, None),
            Ok(OrgMembershipStatus::Pending)
        );
        assert_eq!(
            request_org_membership(true, OrgJoinMode::Closed, None),
            Err(PermissionError::JoinNotAllowed)
        );
        assert_eq!(
            request_org_membership(true, OrgJoinMode::InviteOnly, None),
            Err(PermissionError::JoinNotAllowed)
        );
    }

    #[test]
    fn test_org_join_inactive_organization() {
        assert_eq!(
            request_org_membership(false, OrgJoinMode::Open, None),
            Err(PermissionError::OrganizationInactive)
        );
    }

    #[test]
    fn test_org_join_twice_rejected() {
        let result =
            request_org_membership(true, OrgJoinMode::Open, Some(OrgMembershipStatus::Active));
        assert_eq!(
            result,
            Err(PermissionError::InvalidStatusTransition {
                from: "active",
                event: "request",
            })
        );
    }

    // === Campaign membership table ===

    #[test]
    fn test_campaign_transition_table() {
        let allowed = [
            (None, E::Request, S::Pending),
            (Some(S::Kicked), E::Request, S::Pending),
            (Some(S::Pending), E::Approve, S::Active),
            (Some(S::Pending), E::Kick, S::Kicked),
            (Some(S::Active), E::Kick, S::Kicked),
            (Some(S::Pending), E::Ban, S::Banned),
            (Some(S::Active), E::Ban, S::Banned),
            (Some(S::Kicked), E::Ban, S::Banned),
        ];
        for (current, event, expected) in allowed {
            assert_eq!(
                next_campaign_status(current, event),
                Ok(expected),
                "{current:?} + {event:?}"
            );
        }
    }

    #[test]
    fn test_campaign_rejected_transitions() {
        let rejected = [
            (None, E::Approve),
            (None, E::Kick),
            (None, E::Ban),
            (Some(S::Pending), E::Request),
            (Some(S::Active), E::Request),
            (Some(S::Active), E::Approve),
            (Some(S::Kicked), E::Approve),
            (Some(S::Kicked), E::Kick),
        ];
        for (current, event) in rejected {
            assert!(
                next_campaign_status(current, event).is_err(),
                "{current:?} + {event:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_banned_is_terminal() {
        for event in [E::Request, E::Approve, E::Kick, E::Ban] {
            assert_eq!(
                next_campaign_status(Some(S::Banned), event),
                Err(PermissionError::InvalidStatusTransition {
                    from: "banned",
                    event: event.as_str(),
                })
            );
        }
        assert!(S::Banned.is_terminal());
        assert!(!S::Kicked.is_terminal());
    }

    // === Join requests ===

    #[test]
    fn test_join_requires_recruiting_campaign() {
        for status in CampaignStatus::all() {
            let result = request_campaign_membership(*status, None, 0, 6);
            if status.accepts_players() {
                assert_eq!(result, Ok(S::Pending), "{status:?}");
            } else {
                assert_eq!(
                    result,
                    Err(PermissionError::InvalidStatusTransition {
                        from: status.as_str(),
                        event: "join_request",
                    }),
                    "{status:?}"
                );
            }
        }
    }

    #[test]
    fn test_banned_player_cannot_rejoin() {
        let result = request_campaign_membership(CampaignStatus::Open, Some(S::Banned), 0, 6);
        assert!(matches!(
            result,
            Err(PermissionError::InvalidStatusTransition { from: "banned", .. })
        ));
    }

    #[test]
    fn test_kicked_player_can_rejoin() {
        let result = request_campaign_membership(CampaignStatus::InProgress, Some(S::Kicked), 2, 6);
        assert_eq!(result, Ok(S::Pending));
    }

    #[test]
    fn test_full_campaign_rejects_join() {
        let result = request_campaign_membership(CampaignStatus::Open, None, 4, 4);
        assert_eq!(result, Err(PermissionError::CampaignFull { max_players: 4 }));
    }

    #[test]
    fn test_approve_checks_capacity() {
        assert_eq!(approve_campaign_membership(Some(S::Pending), 3, 4), Ok(S::Active));
        assert_eq!(
            approve_campaign_membership(Some(S::Pending), 4, 4),
            Err(PermissionError::CampaignFull { max_players: 4 })
        );
        assert!(approve_campaign_membership(Some(S::Active), 0, 4).is_err());
    }

    // === Campaign status ===

    #[test]
    fn test_campaign_status_progression() {
        use CampaignStatus as C;
        assert!(C::Draft.can_transition_to(C::Open));
        assert!(C::Open.can_transition_to(C::InProgress));
        assert!(C::InProgress.can_transition_to(C::Paused));
        assert!(C::Paused.can_transition_to(C::InProgress));
        assert!(C::InProgress.can_transition_to(C::Completed));
        assert!(C::Open.can_transition_to(C::Draft));
    }

    #[test]
    fn test_cancel_reachable_before_completion() {
        use CampaignStatus as C;
        for status in [C::Draft, C::Open, C::InProgress, C::Paused] {
            assert!(status.can_transition_to(C::Cancelled), "{status:?}");
        }
        assert!(!C::Completed.can_transition_to(C::Cancelled));
    }

    #[test]
    fn test_terminal_statuses_stay_put() {
        use CampaignStatus as C;
        for terminal in [C::Completed, C::Cancelled] {
            assert!(terminal.is_terminal());
            for next in C::all() {
                assert_eq!(terminal.can_transition_to(*next), terminal == *next);
            }
        }
    }

    #[test]
    fn test_illegal_status_jump() {
        use CampaignStatus as C;
        assert_eq!(
            C::Draft.transition_to(C::InProgress),
            Err(PermissionError::InvalidStatusTransition {
                from: "draft",
                event: "in_progress",
            })
        );
        assert_eq!(C::Draft.transition_to(C::Draft), Ok(C::Draft));
    }

    #[test]
    fn test_campaign_status_serialization() {
        assert_eq!(
            serde_json::to_string(&CampaignStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
