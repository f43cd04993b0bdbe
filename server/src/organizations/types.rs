//! Organization Type Definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::permissions::{OrgJoinMode, OrgRole};

// ============================================================================
// Organization Entity
// ============================================================================

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "org_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrgVisibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub visibility: OrgVisibility,
    pub join_mode: OrgJoinMode,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Organization listed for the current user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrganizationWithRole {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub organization: Organization,
    /// The current user's role.
    pub role: OrgRole,
    /// Number of active members.
    pub member_count: i64,
}

// ============================================================================
// Request Types
// ============================================================================

/// Slugs are lowercase ASCII letters, digits and dashes.
fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid && !slug.starts_with('-') && !slug.ends_with('-') {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_slug"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be 3-255 characters"))]
    pub name: String,
    #[validate(
        length(min = 3, max = 255, message = "Slug must be 3-255 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: OrgVisibility,
    #[serde(default)]
    pub join_mode: OrgJoinMode,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be 3-255 characters"))]
    pub name: Option<String>,
    #[validate(
        length(min = 3, max = 255, message = "Slug must be 3-255 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub visibility: Option<OrgVisibility>,
    pub join_mode: Option<OrgJoinMode>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: OrgRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(validate_slug("dragons-lair-42").is_ok());
        assert!(validate_slug("Dragons").is_err());
        assert!(validate_slug("dragons lair").is_err());
        assert!(validate_slug("-dragons").is_err());
        assert!(validate_slug("dragons_lair").is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateOrganizationRequest =
            serde_json::from_str(r#"{"name": "Dragons", "slug": "dragons"}"#).unwrap();
        assert_eq!(req.visibility, OrgVisibility::Public);
        assert_eq!(req.join_mode, OrgJoinMode::Approval);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_short_name() {
        let req: CreateOrganizationRequest =
            serde_json::from_str(r#"{"name": "D", "slug": "dragons"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_validates_slug() {
        let req = UpdateOrganizationRequest {
            slug: Some("Not A Slug".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_join_mode_wire_format() {
        let mode: OrgJoinMode = serde_json::from_str("\"invite_only\"").unwrap();
        assert_eq!(mode, OrgJoinMode::InviteOnly);
    }
}
