//! Per-element visibility on a campaign board.
//!
//! The stored rule is a small JSON object in one of three shapes:
//! `{"all": true}`, `{"player_ids": [...]}` or `{"character_ids": [...]}`.
//! Anything else (missing, empty, `{"all": false}`, non-UUID ids) reads as
//! [`VisibilityRule::GmOnly`], so a malformed rule hides the element instead
//! of showing it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Who besides the GM may see an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum VisibilityRule {
    /// Every viewer of the board.
    #[default]
    All,
    /// Only the listed users.
    PlayerIds(Vec<Uuid>),
    /// Only users owning one of the listed characters.
    CharacterIds(Vec<Uuid>),
    /// Nobody but the GM.
    GmOnly,
}

impl VisibilityRule {
    /// Whether a non-GM viewer passes this rule.
    #[must_use]
    pub fn permits(&self, viewer: &Viewer) -> bool {
        match self {
            Self::All => true,
            Self::PlayerIds(ids) => ids.contains(&viewer.user_id),
            Self::CharacterIds(ids) => viewer.character_ids.iter().any(|c| ids.contains(c)),
            Self::GmOnly => false,
        }
    }
}

fn parse_ids(value: &Value) -> Option<Vec<Uuid>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
        .collect()
}

impl From<Value> for VisibilityRule {
    fn from(value: Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::GmOnly;
        };

        if obj.get("all").and_then(Value::as_bool) == Some(true) {
            return Self::All;
        }
        if let Some(ids) = obj.get("player_ids") {
            return parse_ids(ids).map_or(Self::GmOnly, Self::PlayerIds);
        }
        if let Some(ids) = obj.get("character_ids") {
            return parse_ids(ids).map_or(Self::GmOnly, Self::CharacterIds);
        }

        Self::GmOnly
    }
}

impl From<VisibilityRule> for Value {
    fn from(rule: VisibilityRule) -> Self {
        match rule {
            VisibilityRule::All => json!({ "all": true }),
            VisibilityRule::PlayerIds(ids) => json!({ "player_ids": ids }),
            VisibilityRule::CharacterIds(ids) => json!({ "character_ids": ids }),
            VisibilityRule::GmOnly => json!({ "all": false }),
        }
    }
}

/// The person a board is being rendered for.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub user_id: Uuid,
    pub is_gm: bool,
    /// Characters this user owns in the campaign.
    pub character_ids: Vec<Uuid>,
}

/// Something on a board that carries its own visibility.
pub trait Visible {
    fn is_visible(&self) -> bool;
    fn visibility(&self) -> &VisibilityRule;
}

/// Whether `viewer` may see `element` at all.
pub fn can_see<T: Visible>(element: &T, viewer: &Viewer) -> bool {
    viewer.is_gm || (element.is_visible() && element.visibility().permits(viewer))
}

/// Keep only the elements `viewer` may see.
///
/// The GM gets the list back untouched. Everyone else loses hidden elements
/// completely, so nothing about them reaches the response.
pub fn filter_elements<T: Visible>(elements: Vec<T>, viewer: &Viewer) -> Vec<T> {
    if viewer.is_gm {
        return elements;
    }

    elements
        .into_iter()
        .filter(|element| can_see(element, viewer))
        .collect()
}
