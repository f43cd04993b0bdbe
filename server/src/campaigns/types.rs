//! Campaign Type Definitions
//!
//! Rows, request bodies and the pure merge/clamp rules the handlers apply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::permissions::visibility::Visible;
use crate::permissions::{CampaignStatus, VisibilityRule};

// ============================================================================
// Campaign
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Creator and game master.
    pub gm_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub universe: Option<String>,
    pub status: CampaignStatus,
    pub max_players: i32,
    pub is_public: bool,
    pub settings: Json<Value>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campaign listed inside an organization.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CampaignSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub campaign: Campaign,
    pub active_players: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be 3-255 characters"))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub universe: Option<String>,
    /// Falls back to the server default.
    pub max_players: Option<i32>,
    #[serde(default)]
    pub is_public: bool,
    pub settings: Option<Value>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCampaignRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be 3-255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub universe: Option<String>,
    pub status: Option<CampaignStatus>,
    pub max_players: Option<i32>,
    pub is_public: Option<bool>,
    pub settings: Option<Value>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct JoinCampaignRequest {
    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub join_message: Option<String>,
}

// ============================================================================
// Characters
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Character {
    pub id: Uuid,
    pub campaign_id: Uuid,
    /// Player owning the character; `None` for GM-controlled NPCs.
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub race: Option<String>,
    pub class: Option<String>,
    pub level: i32,
    pub stats: Json<Value>,
    pub gold: f64,
    pub experience: i32,
    pub backstory: Option<String>,
    pub notes: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub is_alive: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCharacterRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 100))]
    pub race: Option<String>,
    #[validate(length(max = 100))]
    pub class: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub level: Option<i32>,
    pub stats: Option<Value>,
    #[validate(range(min = 0.0))]
    pub gold: Option<f64>,
    #[validate(length(max = 10000))]
    pub backstory: Option<String>,
    #[validate(length(max = 10000))]
    pub notes: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

/// Changes a player may make to their own character.
///
/// Gold, experience and the alive flag belong to the GM; sending them is a
/// deserialization error.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateOwnCharacterRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub race: Option<String>,
    #[validate(length(max = 100))]
    pub class: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub level: Option<i32>,
    pub stats: Option<Value>,
    #[validate(length(max = 10000))]
    pub backstory: Option<String>,
    #[validate(length(max = 10000))]
    pub notes: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GmUpdateCharacterRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub race: Option<String>,
    #[validate(length(max = 100))]
    pub class: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub level: Option<i32>,
    pub stats: Option<Value>,
    #[validate(range(min = 0.0))]
    pub gold: Option<f64>,
    #[validate(range(min = 0))]
    pub experience: Option<i32>,
    #[validate(length(max = 10000))]
    pub backstory: Option<String>,
    #[validate(length(max = 10000))]
    pub notes: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub is_active: Option<bool>,
    pub is_alive: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustGoldRequest {
    pub delta: f64,
}

/// Result of applying a gold delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoldChange {
    pub gold: f64,
    /// The raw sum went below zero and was floored.
    pub clamped: bool,
}

/// Apply `delta` to `current`, flooring at zero.
///
/// Returns `None` when the sum is not a finite number.
#[must_use]
pub fn apply_gold_delta(current: f64, delta: f64) -> Option<GoldChange> {
    let raw = current + delta;
    if !raw.is_finite() {
        return None;
    }

    Some(if raw < 0.0 {
        GoldChange {
            gold: 0.0,
            clamped: true,
        }
    } else {
        GoldChange {
            gold: raw,
            clamped: false,
        }
    })
}

#[derive(Debug, Serialize)]
pub struct GoldAdjustment {
    pub character_id: Uuid,
    pub previous_gold: f64,
    #[serde(flatten)]
    pub change: GoldChange,
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GameItem {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub stats: Json<Value>,
    pub image_url: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryEntry {
    pub id: Uuid,
    pub character_id: Uuid,
    pub game_item_id: Uuid,
    pub quantity: i32,
    pub acquired_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub stats: Option<Value>,
    #[validate(url)]
    pub image_url: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct GiveItemRequest {
    pub character_id: Uuid,
    pub game_item_id: Uuid,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 10000))]
    pub quantity: i32,
}

// ============================================================================
// Board
// ============================================================================

/// Canvas configuration of a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardDimensions {
    pub width: i32,
    pub height: i32,
    pub grid_size: i32,
    pub scale: f64,
    pub show_grid: bool,
    pub grid_color: String,
    pub background_color: String,
}

impl Default for BoardDimensions {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            grid_size: 50,
            scale: 1.0,
            show_grid: true,
            grid_color: "#CCCCCC".into(),
            background_color: "#1a1a2e".into(),
        }
    }
}

/// Partial update of [`BoardDimensions`].
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DimensionsPatch {
    #[validate(range(min = 100, max = 8192))]
    pub width: Option<i32>,
    #[validate(range(min = 100, max = 8192))]
    pub height: Option<i32>,
    #[validate(range(min = 10, max = 500))]
    pub grid_size: Option<i32>,
    #[validate(range(min = 0.1, max = 10.0))]
    pub scale: Option<f64>,
    pub show_grid: Option<bool>,
    #[validate(length(min = 1, max = 32))]
    pub grid_color: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub background_color: Option<String>,
}

impl BoardDimensions {
    /// Overwrite the fields present in `patch`, keep the rest.
    pub fn apply(&mut self, patch: DimensionsPatch) {
        if let Some(v) = patch.width {
            self.width = v;
        }
        if let Some(v) = patch.height {
            self.height = v;
        }
        if let Some(v) = patch.grid_size {
            self.grid_size = v;
        }
        if let Some(v) = patch.scale {
            self.scale = v;
        }
        if let Some(v) = patch.show_grid {
            self.show_grid = v;
        }
        if let Some(v) = patch.grid_color {
            self.grid_color = v;
        }
        if let Some(v) = patch.background_color {
            self.background_color = v;
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Board {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub background_image_url: Option<String>,
    pub dimensions: Json<BoardDimensions>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBoardRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(url)]
    pub background_image_url: Option<String>,
    #[validate(nested)]
    pub dimensions: Option<DimensionsPatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "board_element_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BoardElementType {
    Character,
    Monster,
    Item,
    Map,
    Note,
    Image,
}

/// Placement of an element on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementPosition {
    pub x: f64,
    pub y: f64,
    pub z: i32,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub scale: f64,
    pub opacity: f64,
    pub locked: bool,
}

impl Default for ElementPosition {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            scale: 1.0,
            opacity: 1.0,
            locked: false,
        }
    }
}

/// Partial update of [`ElementPosition`].
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PositionPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<i32>,
    #[validate(range(min = 1.0))]
    pub width: Option<f64>,
    #[validate(range(min = 1.0))]
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    #[validate(range(min = 0.01, max = 100.0))]
    pub scale: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub opacity: Option<f64>,
    pub locked: Option<bool>,
}

impl ElementPosition {
    /// Overwrite the fields present in `patch`, keep the rest.
    pub fn apply(&mut self, patch: PositionPatch) {
        if let Some(v) = patch.x {
            self.x = v;
        }
        if let Some(v) = patch.y {
            self.y = v;
        }
        if let Some(v) = patch.z {
            self.z = v;
        }
        if let Some(v) = patch.width {
            self.width = v;
        }
        if let Some(v) = patch.height {
            self.height = v;
        }
        if let Some(v) = patch.rotation {
            self.rotation = v;
        }
        if let Some(v) = patch.scale {
            self.scale = v;
        }
        if let Some(v) = patch.opacity {
            self.opacity = v;
        }
        if let Some(v) = patch.locked {
            self.locked = v;
        }
    }
}

/// Free-form element payload (label, hit points, note text...).
pub type ElementContent = Map<String, Value>;

/// Shallow merge: top-level keys of `patch` replace those in `content`.
pub fn merge_content(content: &mut ElementContent, patch: ElementContent) {
    content.extend(patch);
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BoardElement {
    pub id: Uuid,
    pub board_id: Uuid,
    pub element_type: BoardElementType,
    pub character_id: Option<Uuid>,
    pub game_item_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub content: Json<ElementContent>,
    pub position: Json<ElementPosition>,
    pub is_visible: bool,
    pub visible_to: Json<VisibilityRule>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Visible for BoardElement {
    fn is_visible(&self) -> bool {
        self.is_visible
    }

    fn visibility(&self) -> &VisibilityRule {
        &self.visible_to.0
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateElementRequest {
    pub element_type: BoardElementType,
    pub character_id: Option<Uuid>,
    pub game_item_id: Option<Uuid>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub content: ElementContent,
    /// Applied over the default position.
    #[validate(nested)]
    pub position: Option<PositionPatch>,
    pub is_visible: Option<bool>,
    pub visible_to: Option<VisibilityRule>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateElementRequest {
    #[validate(url)]
    pub image_url: Option<String>,
    pub content: Option<ElementContent>,
    #[validate(nested)]
    pub position: Option<PositionPatch>,
    pub is_visible: Option<bool>,
    pub visible_to: Option<VisibilityRule>,
}

/// A board as one viewer is allowed to see it.
#[derive(Debug, Serialize)]
pub struct FilteredBoard {
    pub board: Board,
    pub elements: Vec<BoardElement>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gold_floor() {
        assert_eq!(
            apply_gold_delta(5.0, -10.0),
            Some(GoldChange {
                gold: 0.0,
                clamped: true
            })
        );
        let exact = apply_gold_delta(5.0, -5.0).unwrap();
        assert_eq!(exact.gold, 0.0);
        assert!(!exact.clamped);
        assert_eq!(apply_gold_delta(12.5, 7.5).unwrap().gold, 20.0);
    }

    #[test]
    fn test_gold_overflow_is_refused() {
        assert_eq!(apply_gold_delta(f64::MAX, f64::MAX), None);
        assert_eq!(apply_gold_delta(1.0, f64::INFINITY), None);
        assert_eq!(apply_gold_delta(1.0, f64::NAN), None);
        assert!(apply_gold_delta(f64::MAX, -1.0).is_some());
    }

    #[test]
    fn test_gold_never_negative() {
        for current in [0.0, 1.0, 99.5, 10_000.0] {
            for delta in [-1e9, -100.0, -0.5, 0.0, 3.0] {
                let change = apply_gold_delta(current, delta).unwrap();
                assert!(change.gold >= 0.0);
                assert_eq!(change.gold, f64::max(0.0, current + delta));
            }
        }
    }

    #[test]
    fn test_position_partial_update() {
        let mut position = ElementPosition {
            x: 300.0,
            y: 450.0,
            z: 1,
            ..Default::default()
        };
        let patch: PositionPatch = serde_json::from_value(json!({ "x": 400.0 })).unwrap();

        position.apply(patch);
        let once = position;
        position.apply(patch);

        assert_eq!(position, once);
        assert_eq!(position.x, 400.0);
        assert_eq!(position.y, 450.0);
        assert_eq!(position.z, 1);
        assert_eq!(position.width, 100.0);
        assert_eq!(position.opacity, 1.0);
    }

    #[test]
    fn test_stored_position_fills_defaults() {
        let position: ElementPosition = serde_json::from_value(json!({ "x": 12.0 })).unwrap();
        assert_eq!(position.x, 12.0);
        assert_eq!(position.scale, 1.0);
        assert!(!position.locked);
    }

    #[test]
    fn test_position_patch_rejects_unknown_keys() {
        let result: Result<PositionPatch, _> = serde_json::from_value(json!({ "depth": 3 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_position_patch_validates_opacity() {
        let patch = PositionPatch {
            opacity: Some(1.5),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_dimensions_partial_update() {
        let mut dims = BoardDimensions::default();
        dims.apply(DimensionsPatch {
            grid_size: Some(64),
            show_grid: Some(false),
            ..Default::default()
        });

        assert_eq!(dims.grid_size, 64);
        assert!(!dims.show_grid);
        assert_eq!(dims.width, 1920);
        assert_eq!(dims.background_color, "#1a1a2e");
    }

    #[test]
    fn test_dimensions_patch_ranges() {
        let too_wide = DimensionsPatch {
            width: Some(10_000),
            ..Default::default()
        };
        assert!(too_wide.validate().is_err());

        let tiny_scale = DimensionsPatch {
            scale: Some(0.01),
            ..Default::default()
        };
        assert!(tiny_scale.validate().is_err());

        let fine = DimensionsPatch {
            width: Some(4096),
            scale: Some(2.0),
            ..Default::default()
        };
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_dimensions_patch_rejects_unknown_keys() {
        let result: Result<DimensionsPatch, _> =
            serde_json::from_value(json!({ "width": 800, "depth": 2 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_content_merge_is_shallow() {
        let mut content: ElementContent = serde_json::from_value(json!({
            "label": "Goblin",
            "hp": { "current": 7, "max": 7 }
        }))
        .unwrap();
        let patch: ElementContent =
            serde_json::from_value(json!({ "hp": { "current": 3 } })).unwrap();

        merge_content(&mut content, patch);

        assert_eq!(content["label"], "Goblin");
        assert_eq!(content["hp"], json!({ "current": 3 }));
    }

    #[test]
    fn test_player_update_rejects_gold() {
        let result: Result<UpdateOwnCharacterRequest, _> =
            serde_json::from_value(json!({ "name": "Aria", "gold": 1000 }));
        assert!(result.is_err());

        let result: Result<UpdateOwnCharacterRequest, _> =
            serde_json::from_value(json!({ "experience": 5000 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_gm_update_accepts_experience() {
        let req: GmUpdateCharacterRequest =
            serde_json::from_value(json!({ "experience": 5000, "is_alive": false })).unwrap();
        assert_eq!(req.experience, Some(5000));
        assert_eq!(req.is_alive, Some(false));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_give_item_default_quantity() {
        let req: GiveItemRequest = serde_json::from_value(json!({
            "character_id": Uuid::now_v7(),
            "game_item_id": Uuid::now_v7()
        }))
        .unwrap();
        assert_eq!(req.quantity, 1);
    }

    #[test]
    fn test_element_request_visibility_defaults_closed_on_garbage() {
        let req: CreateElementRequest = serde_json::from_value(json!({
            "element_type": "monster",
            "visible_to": { "player_ids": "everyone" }
        }))
        .unwrap();
        assert_eq!(req.visible_to, Some(VisibilityRule::GmOnly));
        assert!(req.content.is_empty());
    }
}
