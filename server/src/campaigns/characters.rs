//! Character Handlers
//!
//! Players edit their own characters; the GM edits any character and owns
//! gold, experience and the alive flag.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::types::Json as SqlJson;
use sqlx::PgConnection;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::error::CampaignError;
use super::types::{
    apply_gold_delta, AdjustGoldRequest, Character, CreateCharacterRequest, GmUpdateCharacterRequest,
    GoldAdjustment, UpdateOwnCharacterRequest,
};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::permissions::{load_campaign_context, require_campaign_action, Action};

const CHARACTER_COLUMNS: &str = "id, campaign_id, owner_id, name, race, class, level, stats, gold, experience, backstory, notes, avatar_url, is_active, is_alive, created_at, updated_at";

/// Load a character of the campaign, locking it for the transaction.
async fn lock_character(
    conn: &mut PgConnection,
    campaign_id: Uuid,
    character_id: Uuid,
) -> Result<Character, CampaignError> {
    sqlx::query_as::<_, Character>(&format!(
        "SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = $1 AND campaign_id = $2 FOR UPDATE"
    ))
    .bind(character_id)
    .bind(campaign_id)
    .fetch_optional(conn)
    .await?
    .ok_or(CampaignError::CharacterNotFound)
}

/// List characters of a campaign (GM or active player).
///
/// GET /api/campaigns/{campaign_id}/characters
#[tracing::instrument(skip(state))]
pub async fn list_characters(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<Character>>, CampaignError> {
    let mut conn = state.db.acquire().await?;

    require_campaign_action(&mut conn, auth.actor(), campaign_id, Action::ListCharacters)
        .await?;

    let characters = sqlx::query_as::<_, Character>(&format!(
        "SELECT {CHARACTER_COLUMNS} FROM characters WHERE campaign_id = $1 ORDER BY name ASC"
    ))
    .bind(campaign_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Json(characters))
}

/// Create a character.
///
/// An active player creates a character they own. The GM creates NPCs,
/// which have no owner.
///
/// POST /api/campaigns/{campaign_id}/characters
#[tracing::instrument(skip(state))]
pub async fn create_character(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<CreateCharacterRequest>,
) -> Result<(StatusCode, Json<Character>), CampaignError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    let ctx =
        require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::CreateCharacter)
            .await?;
    let owner_id = if ctx.is_gm() { None } else { Some(auth.id) };

    let stats = body
        .stats
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

    let character = sqlx::query_as::<_, Character>(&format!(
        r"INSERT INTO characters (id, campaign_id, owner_id, name, race, class, level, stats, gold, backstory, notes, avatar_url)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
           RETURNING {CHARACTER_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(campaign_id)
    .bind(owner_id)
    .bind(&body.name)
    .bind(&body.race)
    .bind(&body.class)
    .bind(body.level.unwrap_or(1))
    .bind(SqlJson(stats))
    .bind(body.gold.unwrap_or(0.0))
    .bind(&body.backstory)
    .bind(&body.notes)
    .bind(&body.avatar_url)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        character_id = %character.id,
        npc = owner_id.is_none(),
        "Character created"
    );

    Ok((StatusCode::CREATED, Json(character)))
}

/// Update one's own character (owner with an active membership).
///
/// PATCH /api/campaigns/{campaign_id}/characters/{character_id}
#[tracing::instrument(skip(state))]
pub async fn update_own_character(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, character_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateOwnCharacterRequest>,
) -> Result<Json<Character>, CampaignError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    let ctx = load_campaign_context(&mut tx, auth.actor(), campaign_id)
        .await?
        .ok_or(CampaignError::NotFound)?;
    // Outsiders cannot probe character ids.
    ctx.require(&Action::ListCharacters)?;

    let character = lock_character(&mut tx, campaign_id, character_id).await?;
    ctx.require(&Action::UpdateOwnCharacter {
        owner_id: character.owner_id,
    })?;

    let character = sqlx::query_as::<_, Character>(&format!(
        r"UPDATE characters
           SET name = COALESCE($2, name),
               race = COALESCE($3, race),
               class = COALESCE($4, class),
               level = COALESCE($5, level),
               stats = COALESCE($6, stats),
               backstory = COALESCE($7, backstory),
               notes = COALESCE($8, notes),
               avatar_url = COALESCE($9, avatar_url),
               updated_at = NOW()
           WHERE id = $1
           RETURNING {CHARACTER_COLUMNS}"
    ))
    .bind(character_id)
    .bind(&body.name)
    .bind(&body.race)
    .bind(&body.class)
    .bind(body.level)
    .bind(body.stats.map(SqlJson))
    .bind(&body.backstory)
    .bind(&body.notes)
    .bind(&body.avatar_url)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(character))
}

/// Update any character of the campaign (GM only).
///
/// PATCH /api/campaigns/{campaign_id}/characters/{character_id}/gm
#[tracing::instrument(skip(state))]
pub async fn gm_update_character(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, character_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<GmUpdateCharacterRequest>,
) -> Result<Json<Character>, CampaignError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::GmUpdateCharacter)
        .await?;
    lock_character(&mut tx, campaign_id, character_id).await?;

    let character = sqlx::query_as::<_, Character>(&format!(
        r"UPDATE characters
           SET name = COALESCE($2, name),
               race = COALESCE($3, race),
               class = COALESCE($4, class),
               level = COALESCE($5, level),
               stats = COALESCE($6, stats),
               gold = COALESCE($7, gold),
               experience = COALESCE($8, experience),
               backstory = COALESCE($9, backstory),
               notes = COALESCE($10, notes),
               avatar_url = COALESCE($11, avatar_url),
               is_active = COALESCE($12, is_active),
               is_alive = COALESCE($13, is_alive),
               updated_at = NOW()
           WHERE id = $1
           RETURNING {CHARACTER_COLUMNS}"
    ))
    .bind(character_id)
    .bind(&body.name)
    .bind(&body.race)
    .bind(&body.class)
    .bind(body.level)
    .bind(body.stats.map(SqlJson))
    .bind(body.gold)
    .bind(body.experience)
    .bind(&body.backstory)
    .bind(&body.notes)
    .bind(&body.avatar_url)
    .bind(body.is_active)
    .bind(body.is_alive)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        character_id = %character_id,
        gm_id = %auth.id,
        "Character updated by GM"
    );

    Ok(Json(character))
}

/// Add or remove gold (GM only). The balance floors at zero.
///
/// The character row stays locked between reading the balance and writing
/// the new one, so concurrent adjustments serialize.
///
/// POST /api/campaigns/{campaign_id}/characters/{character_id}/gold
#[tracing::instrument(skip(state))]
pub async fn adjust_gold(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, character_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<AdjustGoldRequest>,
) -> Result<Json<GoldAdjustment>, CampaignError> {
    if !body.delta.is_finite() {
        return Err(CampaignError::Validation("delta must be a finite number".into()));
    }

    let mut tx = state.db.begin().await?;

    require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::AdjustGold).await?;

    let character = lock_character(&mut tx, campaign_id, character_id).await?;
    let change = apply_gold_delta(character.gold, body.delta)
        .ok_or_else(|| CampaignError::Validation("gold balance out of range".into()))?;

    sqlx::query("UPDATE characters SET gold = $2, updated_at = NOW() WHERE id = $1")
        .bind(character_id)
        .bind(change.gold)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if change.clamped {
        debug!(
            character_id = %character_id,
            previous_gold = character.gold,
            delta = body.delta,
            "Gold adjustment clamped at zero"
        );
    }

    Ok(Json(GoldAdjustment {
        character_id,
        previous_gold: character.gold,
        change,
    }))
}
