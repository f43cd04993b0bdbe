//! Campaign Handlers
//!
//! Creation, listing and GM updates of campaigns, including status moves.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::types::Json as SqlJson;
use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::error::CampaignError;
use super::types::{
    BoardDimensions, Campaign, CampaignSummary, CreateCampaignRequest, UpdateCampaignRequest,
};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::permissions::{
    queries, require_campaign_action, require_organization_action, Action, CampaignStatus,
};

pub(super) const CAMPAIGN_COLUMNS: &str = "id, organization_id, gm_id, name, description, universe, status, max_players, is_public, settings, started_at, ended_at, created_at, updated_at";

const DEFAULT_BOARD_NAME: &str = "Main board";

fn check_max_players(max_players: i32, limit: i32) -> Result<(), CampaignError> {
    if (1..=limit).contains(&max_players) {
        Ok(())
    } else {
        Err(CampaignError::Validation(format!(
            "max_players must be between 1 and {limit}"
        )))
    }
}

pub(super) async fn fetch_campaign(
    conn: &mut PgConnection,
    campaign_id: Uuid,
) -> Result<Campaign, CampaignError> {
    sqlx::query_as::<_, Campaign>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
    ))
    .bind(campaign_id)
    .fetch_optional(conn)
    .await?
    .ok_or(CampaignError::NotFound)
}

/// Create a campaign in an organization (mj and above).
///
/// The creator becomes the GM. The campaign starts as a draft and gets its
/// board in the same transaction.
///
/// POST /api/organizations/{org_id}/campaigns
#[tracing::instrument(skip(state))]
pub async fn create_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(body): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), CampaignError> {
    body.validate()?;

    let max_players = body
        .max_players
        .unwrap_or(state.config.default_max_players);
    check_max_players(max_players, state.config.max_players_limit)?;

    let mut tx = state.db.begin().await?;

    require_organization_action(&mut tx, auth.actor(), org_id, Action::CreateCampaign)
        .await
        .map_err(CampaignError::from_org_scope)?;

    let settings = body
        .settings
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

    let campaign = sqlx::query_as::<_, Campaign>(&format!(
        r"INSERT INTO campaigns (id, organization_id, gm_id, name, description, universe, status, max_players, is_public, settings)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
           RETURNING {CAMPAIGN_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(org_id)
    .bind(auth.id)
    .bind(&body.name)
    .bind(&body.description)
    .bind(&body.universe)
    .bind(CampaignStatus::Draft)
    .bind(max_players)
    .bind(body.is_public)
    .bind(SqlJson(settings))
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO boards (id, campaign_id, name, dimensions) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::now_v7())
    .bind(campaign.id)
    .bind(DEFAULT_BOARD_NAME)
    .bind(SqlJson(BoardDimensions::default()))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        campaign_id = %campaign.id,
        organization_id = %org_id,
        gm_id = %auth.id,
        "Campaign created"
    );

    Ok((StatusCode::CREATED, Json(campaign)))
}

/// List campaigns of an organization.
///
/// Private campaigns only show up for their GM and their players.
///
/// GET /api/organizations/{org_id}/campaigns
#[tracing::instrument(skip(state))]
pub async fn list_campaigns(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Vec<CampaignSummary>>, CampaignError> {
    let mut conn = state.db.acquire().await?;

    require_organization_action(&mut conn, auth.actor(), org_id, Action::ListCampaigns)
        .await
        .map_err(CampaignError::from_org_scope)?;

    let campaigns = sqlx::query_as::<_, CampaignSummary>(
        r"
        SELECT c.id, c.organization_id, c.gm_id, c.name, c.description, c.universe, c.status,
               c.max_players, c.is_public, c.settings, c.started_at, c.ended_at,
               c.created_at, c.updated_at,
               (SELECT COUNT(*) FROM campaign_memberships m
                 WHERE m.campaign_id = c.id AND m.status = 'active') AS active_players
        FROM campaigns c
        WHERE c.organization_id = $1
          AND (
            c.is_public
            OR c.gm_id = $2
            OR EXISTS (
                SELECT 1 FROM campaign_memberships m
                WHERE m.campaign_id = c.id AND m.user_id = $2
                  AND m.status IN ('pending', 'active')
            )
          )
        ORDER BY c.created_at DESC
        ",
    )
    .bind(org_id)
    .bind(auth.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Json(campaigns))
}

/// Get campaign details (GM or active player).
///
/// GET /api/campaigns/{campaign_id}
#[tracing::instrument(skip(state))]
pub async fn get_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Campaign>, CampaignError> {
    let mut conn = state.db.acquire().await?;

    require_campaign_action(&mut conn, auth.actor(), campaign_id, Action::ViewCampaign).await?;

    let campaign = fetch_campaign(&mut conn, campaign_id).await?;

    Ok(Json(campaign))
}

/// Update a campaign (GM only).
///
/// A status change must follow the campaign status table. Entering
/// `in_progress` stamps `started_at` once; entering a terminal status stamps
/// `ended_at`.
///
/// PATCH /api/campaigns/{campaign_id}
#[tracing::instrument(skip(state))]
pub async fn update_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<UpdateCampaignRequest>,
) -> Result<Json<Campaign>, CampaignError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    queries::lock_campaign(&mut *tx, campaign_id).await?;
    let ctx =
        require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::UpdateCampaign)
            .await?;
    let current = *ctx.campaign()?;

    let next_status = body
        .status
        .map(|next| current.status.transition_to(next))
        .transpose()?;

    if let Some(max_players) = body.max_players {
        check_max_players(max_players, state.config.max_players_limit)?;
        let active = queries::count_active_players(&mut *tx, campaign_id).await?;
        if i64::from(max_players) < active {
            return Err(CampaignError::Validation(format!(
                "max_players cannot be below the {active} active players"
            )));
        }
    }

    let starting = next_status == Some(CampaignStatus::InProgress);
    let ending = next_status.is_some_and(CampaignStatus::is_terminal);

    let campaign = sqlx::query_as::<_, Campaign>(&format!(
        r"UPDATE campaigns
           SET name = COALESCE($2, name),
               description = COALESCE($3, description),
               universe = COALESCE($4, universe),
               status = COALESCE($5, status),
               max_players = COALESCE($6, max_players),
               is_public = COALESCE($7, is_public),
               settings = COALESCE($8, settings),
               started_at = CASE WHEN $9 AND started_at IS NULL THEN NOW() ELSE started_at END,
               ended_at = CASE WHEN $10 AND ended_at IS NULL THEN NOW() ELSE ended_at END,
               updated_at = NOW()
           WHERE id = $1
           RETURNING {CAMPAIGN_COLUMNS}"
    ))
    .bind(campaign_id)
    .bind(&body.name)
    .bind(&body.description)
    .bind(&body.universe)
    .bind(next_status)
    .bind(body.max_players)
    .bind(body.is_public)
    .bind(body.settings.map(SqlJson))
    .bind(starting)
    .bind(ending)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    if let Some(next) = next_status.filter(|next| *next != current.status) {
        info!(
            campaign_id = %campaign_id,
            from = current.status.as_str(),
            to = next.as_str(),
            "Campaign status changed"
        );
    }

    Ok(Json(campaign))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_players_bounds() {
        assert!(check_max_players(1, 50).is_ok());
        assert!(check_max_players(50, 50).is_ok());
        assert!(matches!(
            check_max_players(0, 50),
            Err(CampaignError::Validation(_))
        ));
        assert!(matches!(
            check_max_players(51, 50),
            Err(CampaignError::Validation(_))
        ));
    }
}
