//! Game Item Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::types::Json as SqlJson;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::error::CampaignError;
use super::queries::{character_in_campaign, item_in_campaign};
use super::types::{CreateItemRequest, GameItem, GiveItemRequest, InventoryEntry};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::permissions::{require_campaign_action, Action};

const ITEM_COLUMNS: &str =
    "id, campaign_id, name, description, stats, image_url, created_by, created_at";

const INVENTORY_COLUMNS: &str = "id, character_id, game_item_id, quantity, acquired_at, updated_at";

/// List the campaign's items (GM or active player).
///
/// GET /api/campaigns/{campaign_id}/items
#[tracing::instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<GameItem>>, CampaignError> {
    let mut conn = state.db.acquire().await?;

    require_campaign_action(&mut conn, auth.actor(), campaign_id, Action::ViewCampaign).await?;

    let items = sqlx::query_as::<_, GameItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM game_items WHERE campaign_id = $1 ORDER BY name ASC"
    ))
    .bind(campaign_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Json(items))
}

/// Create an item (GM only).
///
/// POST /api/campaigns/{campaign_id}/items
#[tracing::instrument(skip(state))]
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<GameItem>), CampaignError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::CreateItem).await?;

    let stats = body
        .stats
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

    let item = sqlx::query_as::<_, GameItem>(&format!(
        r"INSERT INTO game_items (id, campaign_id, name, description, stats, image_url, created_by)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           RETURNING {ITEM_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(campaign_id)
    .bind(&body.name)
    .bind(&body.description)
    .bind(SqlJson(stats))
    .bind(&body.image_url)
    .bind(auth.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Give an item to a character (GM only).
///
/// Both must belong to the campaign. Giving an item the character already
/// carries adds to the existing stack.
///
/// POST /api/campaigns/{campaign_id}/items/give
#[tracing::instrument(skip(state))]
pub async fn give_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<GiveItemRequest>,
) -> Result<Json<InventoryEntry>, CampaignError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::GiveItem).await?;

    if !character_in_campaign(&mut *tx, campaign_id, body.character_id).await? {
        return Err(CampaignError::CharacterNotFound);
    }
    if !item_in_campaign(&mut *tx, campaign_id, body.game_item_id).await? {
        return Err(CampaignError::ItemNotFound);
    }

    let entry = sqlx::query_as::<_, InventoryEntry>(&format!(
        r"INSERT INTO inventory (id, character_id, game_item_id, quantity)
           VALUES ($1, $2, $3, $4)
           ON CONFLICT (character_id, game_item_id) DO UPDATE
           SET quantity = inventory.quantity + EXCLUDED.quantity,
               updated_at = NOW()
           RETURNING {INVENTORY_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(body.character_id)
    .bind(body.game_item_id)
    .bind(body.quantity)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        character_id = %body.character_id,
        game_item_id = %body.game_item_id,
        quantity = body.quantity,
        total = entry.quantity,
        "Item given"
    );

    Ok(Json(entry))
}

/// A character's inventory (GM or active player).
///
/// GET /api/campaigns/{campaign_id}/characters/{character_id}/inventory
#[tracing::instrument(skip(state))]
pub async fn get_inventory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, character_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<InventoryEntry>>, CampaignError> {
    let mut conn = state.db.acquire().await?;

    require_campaign_action(&mut conn, auth.actor(), campaign_id, Action::ListCharacters)
        .await?;

    if !character_in_campaign(&mut *conn, campaign_id, character_id).await? {
        return Err(CampaignError::CharacterNotFound);
    }

    let entries = sqlx::query_as::<_, InventoryEntry>(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE character_id = $1 ORDER BY acquired_at ASC"
    ))
    .bind(character_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Json(entries))
}
