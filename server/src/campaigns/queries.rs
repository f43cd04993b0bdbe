//! Lookups shared by the campaign handlers.

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::db_error;

/// Whether a character belongs to the campaign.
pub async fn character_in_campaign<'e, E>(
    executor: E,
    campaign_id: Uuid,
    character_id: Uuid,
) -> sqlx::Result<bool>
where
    E: PgExecutor<'e>,
{
    let result: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM characters WHERE id = $1 AND campaign_id = $2)",
    )
    .bind(character_id)
    .bind(campaign_id)
    .fetch_one(executor)
    .await
    .map_err(db_error!("character_in_campaign", campaign_id = %campaign_id, character_id = %character_id))?;

    Ok(result.0)
}

/// Whether a game item belongs to the campaign.
pub async fn item_in_campaign<'e, E>(
    executor: E,
    campaign_id: Uuid,
    game_item_id: Uuid,
) -> sqlx::Result<bool>
where
    E: PgExecutor<'e>,
{
    let result: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM game_items WHERE id = $1 AND campaign_id = $2)",
    )
    .bind(game_item_id)
    .bind(campaign_id)
    .fetch_one(executor)
    .await
    .map_err(db_error!("item_in_campaign", campaign_id = %campaign_id, game_item_id = %game_item_id))?;

    Ok(result.0)
}

/// Ids of the characters a user owns in a campaign.
pub async fn owned_character_ids<'e, E>(
    executor: E,
    campaign_id: Uuid,
    user_id: Uuid,
) -> sqlx::Result<Vec<Uuid>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar("SELECT id FROM characters WHERE campaign_id = $1 AND owner_id = $2")
        .bind(campaign_id)
        .bind(user_id)
        .fetch_all(executor)
        .await
        .map_err(db_error!("owned_character_ids", campaign_id = %campaign_id, user_id = %user_id))
}
