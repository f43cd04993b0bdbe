//! Platform-level roles and the administrative actions they unlock.
//!
//! Global roles are independent of organization roles: a global admin gains
//! no implicit access inside organizations or campaigns.

use serde::{Deserialize, Serialize};

/// Platform-wide role of a user account.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "global_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    #[default]
    User,
    Admin,
}

impl GlobalRole {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Platform-wide action that only global admins may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemPermission {
    /// Permanently delete an organization and everything it owns
    DeleteOrganization,
    /// Change another user's global role
    PromoteUser,
}

impl SystemPermission {
    /// Returns the action name used in log entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabletop_server::permissions::SystemPermission;
    ///
    /// let perm = SystemPermission::PromoteUser;
    /// assert_eq!(perm.action_name(), "promote_user");
    /// ```
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::DeleteOrganization => "delete_organization",
            Self::PromoteUser => "promote_user",
        }
    }

    /// Returns all system permissions as a slice.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::DeleteOrganization, Self::PromoteUser]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_are_snake_case() {
        for perm in SystemPermission::all() {
            let name = perm.action_name();
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "action name {name} should be snake_case"
            );
        }
    }

    #[test]
    fn test_action_names_are_unique() {
        let mut names: Vec<_> = SystemPermission::all()
            .iter()
            .map(|p| p.action_name())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SystemPermission::all().len());
    }

    #[test]
    fn test_action_name_matches_serde() {
        for perm in SystemPermission::all() {
            let json = serde_json::to_string(perm).unwrap();
            assert_eq!(json, format!("\"{}\"", perm.action_name()));
        }
    }

    #[test]
    fn test_global_role_default_is_user() {
        assert_eq!(GlobalRole::default(), GlobalRole::User);
        assert!(!GlobalRole::User.is_admin());
        assert!(GlobalRole::Admin.is_admin());
    }

    #[test]
    fn test_global_role_serialization() {
        assert_eq!(serde_json::to_string(&GlobalRole::Admin).unwrap(), "\"admin\"");
        let role: GlobalRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, GlobalRole::User);
    }
}
