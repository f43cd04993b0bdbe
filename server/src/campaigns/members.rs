//! Campaign Membership Handlers
//!
//! Join requests and the GM's approve/kick/ban moves. Every move runs
//! through the campaign membership transition table with the campaign row
//! locked, so seat counting and the status change see the same state.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::error::CampaignError;
use super::types::JoinCampaignRequest;
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::permissions::membership::{
    approve_campaign_membership, next_campaign_status, request_campaign_membership,
    CampaignMembershipEvent,
};
use crate::permissions::{
    load_campaign_context, queries, require_campaign_action, Action, CampaignMember,
    CampaignMembershipStatus,
};

fn status_name(status: Option<CampaignMembershipStatus>) -> &'static str {
    status.map_or("none", CampaignMembershipStatus::as_str)
}

/// Ask to join a campaign.
///
/// POST /api/campaigns/{campaign_id}/join
#[tracing::instrument(skip(state))]
pub async fn join_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<JoinCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignMember>), CampaignError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    queries::lock_campaign(&mut *tx, campaign_id).await?;
    let ctx = load_campaign_context(&mut tx, auth.actor(), campaign_id)
        .await?
        .ok_or(CampaignError::NotFound)?;
    ctx.require(&Action::JoinCampaign)?;

    let campaign = *ctx.campaign()?;
    let active = queries::count_active_players(&mut *tx, campaign_id).await?;

    let status = request_campaign_membership(
        campaign.status,
        ctx.campaign_membership,
        active,
        campaign.max_players,
    )?;

    let membership = queries::upsert_campaign_request(
        &mut *tx,
        campaign_id,
        auth.id,
        status,
        body.join_message.as_deref(),
    )
    .await?;

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        user_id = %auth.id,
        from = status_name(ctx.campaign_membership),
        event = CampaignMembershipEvent::Request.as_str(),
        to = status.as_str(),
        "Campaign membership transition"
    );

    Ok((StatusCode::CREATED, Json(membership)))
}

/// List the campaign's memberships (GM or active player).
///
/// GET /api/campaigns/{campaign_id}/members
#[tracing::instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<CampaignMember>>, CampaignError> {
    let mut conn = state.db.acquire().await?;

    require_campaign_action(&mut conn, auth.actor(), campaign_id, Action::ViewCampaign).await?;

    let members = queries::list_campaign_members(&mut *conn, campaign_id).await?;

    Ok(Json(members))
}

/// Approve a pending player (GM only).
///
/// POST /api/campaigns/{campaign_id}/members/{user_id}/approve
#[tracing::instrument(skip(state))]
pub async fn approve_player(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CampaignMember>, CampaignError> {
    apply_gm_event(
        &state,
        &auth,
        campaign_id,
        user_id,
        CampaignMembershipEvent::Approve,
    )
    .await
    .map(Json)
}

/// Remove a player; they may ask to join again (GM only).
///
/// POST /api/campaigns/{campaign_id}/members/{user_id}/kick
#[tracing::instrument(skip(state))]
pub async fn kick_player(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CampaignMember>, CampaignError> {
    apply_gm_event(
        &state,
        &auth,
        campaign_id,
        user_id,
        CampaignMembershipEvent::Kick,
    )
    .await
    .map(Json)
}

/// Ban a player for good (GM only).
///
/// POST /api/campaigns/{campaign_id}/members/{user_id}/ban
#[tracing::instrument(skip(state))]
pub async fn ban_player(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CampaignMember>, CampaignError> {
    apply_gm_event(
        &state,
        &auth,
        campaign_id,
        user_id,
        CampaignMembershipEvent::Ban,
    )
    .await
    .map(Json)
}

const fn gm_action(event: CampaignMembershipEvent) -> Action {
    match event {
        CampaignMembershipEvent::Approve | CampaignMembershipEvent::Request => {
            Action::ApprovePlayer
        }
        CampaignMembershipEvent::Kick => Action::KickPlayer,
        CampaignMembershipEvent::Ban => Action::BanPlayer,
    }
}

async fn apply_gm_event(
    state: &AppState,
    auth: &AuthUser,
    campaign_id: Uuid,
    user_id: Uuid,
    event: CampaignMembershipEvent,
) -> Result<CampaignMember, CampaignError> {
    let mut tx = state.db.begin().await?;

    queries::lock_campaign(&mut *tx, campaign_id).await?;
    let ctx =
        require_campaign_action(&mut tx, auth.actor(), campaign_id, gm_action(event)).await?;
    let campaign = *ctx.campaign()?;

    let current = queries::get_campaign_membership(&mut *tx, campaign_id, user_id)
        .await?
        .map(|m| m.status);

    let next = if event == CampaignMembershipEvent::Approve {
        let active = queries::count_active_players(&mut *tx, campaign_id).await?;
        approve_campaign_membership(current, active, campaign.max_players)?
    } else {
        next_campaign_status(current, event)?
    };

    let membership =
        queries::set_campaign_membership_status(&mut *tx, campaign_id, user_id, next).await?;

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        user_id = %user_id,
        gm_id = %auth.id,
        from = status_name(current),
        event = event.as_str(),
        to = next.as_str(),
        "Campaign membership transition"
    );

    Ok(membership)
}
