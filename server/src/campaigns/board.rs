//! Campaign Board Handlers
//!
//! The GM edits the board; everyone else only reads it through
//! [`filter_board`], which drops every element the viewer may not see.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::types::Json as SqlJson;
use sqlx::PgConnection;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::error::CampaignError;
use super::queries::{character_in_campaign, item_in_campaign, owned_character_ids};
use super::types::{
    merge_content, Board, BoardElement, CreateElementRequest, ElementPosition, FilteredBoard,
    UpdateBoardRequest, UpdateElementRequest,
};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::permissions::{filter_elements, require_campaign_action, Action, Viewer};

const BOARD_COLUMNS: &str =
    "id, campaign_id, name, background_image_url, dimensions, created_at, updated_at";

const ELEMENT_COLUMNS: &str = "id, board_id, element_type, character_id, game_item_id, image_url, content, position, is_visible, visible_to, created_by, created_at, updated_at";

/// The board as `viewer` may see it.
pub fn filter_board(board: Board, elements: Vec<BoardElement>, viewer: &Viewer) -> FilteredBoard {
    FilteredBoard {
        board,
        elements: filter_elements(elements, viewer),
    }
}

async fn fetch_board(
    conn: &mut PgConnection,
    campaign_id: Uuid,
    lock: bool,
) -> Result<Board, CampaignError> {
    let suffix = if lock { " FOR UPDATE" } else { "" };
    sqlx::query_as::<_, Board>(&format!(
        "SELECT {BOARD_COLUMNS} FROM boards WHERE campaign_id = $1{suffix}"
    ))
    .bind(campaign_id)
    .fetch_optional(conn)
    .await?
    .ok_or(CampaignError::NotFound)
}

/// Check that linked characters and items belong to the same campaign.
async fn check_links(
    conn: &mut PgConnection,
    campaign_id: Uuid,
    character_id: Option<Uuid>,
    game_item_id: Option<Uuid>,
) -> Result<(), CampaignError> {
    if let Some(character_id) = character_id {
        if !character_in_campaign(&mut *conn, campaign_id, character_id).await? {
            return Err(CampaignError::CharacterNotFound);
        }
    }
    if let Some(game_item_id) = game_item_id {
        if !item_in_campaign(&mut *conn, campaign_id, game_item_id).await? {
            return Err(CampaignError::ItemNotFound);
        }
    }
    Ok(())
}

/// Read the board (GM or active player).
///
/// Membership and elements are read in one repeatable-read snapshot, so an
/// element hidden in the same instant a player is kicked cannot slip through.
///
/// GET /api/campaigns/{campaign_id}/board
#[tracing::instrument(skip(state))]
pub async fn get_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<FilteredBoard>, CampaignError> {
    let mut tx = state.db.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;

    let ctx =
        require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::ViewBoard).await?;

    let board = fetch_board(&mut tx, campaign_id, false).await?;
    let elements = sqlx::query_as::<_, BoardElement>(&format!(
        r"SELECT {ELEMENT_COLUMNS} FROM board_elements
           WHERE board_id = $1
           ORDER BY (position->>'z')::int ASC NULLS FIRST, created_at ASC"
    ))
    .bind(board.id)
    .fetch_all(&mut *tx)
    .await?;

    let is_gm = ctx.is_gm();
    let character_ids = if is_gm {
        Vec::new()
    } else {
        owned_character_ids(&mut *tx, campaign_id, auth.id).await?
    };

    tx.commit().await?;

    let viewer = Viewer {
        user_id: auth.id,
        is_gm,
        character_ids,
    };
    let total = elements.len();
    let filtered = filter_board(board, elements, &viewer);

    debug!(
        campaign_id = %campaign_id,
        viewer_id = %auth.id,
        total,
        shown = filtered.elements.len(),
        "Board filtered"
    );

    Ok(Json(filtered))
}

/// Update the board's name, background or canvas settings (GM only).
///
/// `dimensions` merges key by key into the stored settings.
///
/// PATCH /api/campaigns/{campaign_id}/board
#[tracing::instrument(skip(state))]
pub async fn update_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<UpdateBoardRequest>,
) -> Result<Json<Board>, CampaignError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::UpdateBoard).await?;

    let board = fetch_board(&mut tx, campaign_id, true).await?;
    let mut dimensions = board.dimensions.0;
    if let Some(patch) = body.dimensions {
        dimensions.apply(patch);
    }

    let board = sqlx::query_as::<_, Board>(&format!(
        r"UPDATE boards
           SET name = COALESCE($2, name),
               background_image_url = COALESCE($3, background_image_url),
               dimensions = $4,
               updated_at = NOW()
           WHERE id = $1
           RETURNING {BOARD_COLUMNS}"
    ))
    .bind(board.id)
    .bind(&body.name)
    .bind(&body.background_image_url)
    .bind(SqlJson(dimensions))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(board))
}

/// Place a new element on the board (GM only).
///
/// POST /api/campaigns/{campaign_id}/board/elements
#[tracing::instrument(skip(state))]
pub async fn create_element(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<CreateElementRequest>,
) -> Result<(StatusCode, Json<BoardElement>), CampaignError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::CreateElement).await?;

    let board = fetch_board(&mut tx, campaign_id, false).await?;
    check_links(&mut tx, campaign_id, body.character_id, body.game_item_id).await?;

    let mut position = ElementPosition::default();
    if let Some(patch) = body.position {
        position.apply(patch);
    }

    let element = sqlx::query_as::<_, BoardElement>(&format!(
        r"INSERT INTO board_elements
             (id, board_id, element_type, character_id, game_item_id, image_url, content, position, is_visible, visible_to, created_by)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
           RETURNING {ELEMENT_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(board.id)
    .bind(body.element_type)
    .bind(body.character_id)
    .bind(body.game_item_id)
    .bind(&body.image_url)
    .bind(SqlJson(body.content))
    .bind(SqlJson(position))
    .bind(body.is_visible.unwrap_or(true))
    .bind(SqlJson(body.visible_to.unwrap_or_default()))
    .bind(auth.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        element_id = %element.id,
        element_type = ?element.element_type,
        "Board element created"
    );

    Ok((StatusCode::CREATED, Json(element)))
}

/// Update an element (GM only).
///
/// `position` merges key by key, `content` merges its top-level keys.
///
/// PATCH /api/campaigns/{campaign_id}/board/elements/{element_id}
#[tracing::instrument(skip(state))]
pub async fn update_element(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, element_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateElementRequest>,
) -> Result<Json<BoardElement>, CampaignError> {
    body.validate()?;

    let mut tx = state.db.begin().await?;

    require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::UpdateElement).await?;

    let board = fetch_board(&mut tx, campaign_id, false).await?;
    let element = sqlx::query_as::<_, BoardElement>(&format!(
        "SELECT {ELEMENT_COLUMNS} FROM board_elements WHERE id = $1 AND board_id = $2 FOR UPDATE"
    ))
    .bind(element_id)
    .bind(board.id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(CampaignError::ElementNotFound)?;

    let mut position = element.position.0;
    if let Some(patch) = body.position {
        position.apply(patch);
    }
    let mut content = element.content.0;
    if let Some(patch) = body.content {
        merge_content(&mut content, patch);
    }
    let visible_to = body.visible_to.unwrap_or(element.visible_to.0);

    let element = sqlx::query_as::<_, BoardElement>(&format!(
        r"UPDATE board_elements
           SET image_url = COALESCE($2, image_url),
               content = $3,
               position = $4,
               is_visible = COALESCE($5, is_visible),
               visible_to = $6,
               updated_at = NOW()
           WHERE id = $1
           RETURNING {ELEMENT_COLUMNS}"
    ))
    .bind(element_id)
    .bind(&body.image_url)
    .bind(SqlJson(content))
    .bind(SqlJson(position))
    .bind(body.is_visible)
    .bind(SqlJson(visible_to))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(element))
}

/// Remove an element (GM only).
///
/// DELETE /api/campaigns/{campaign_id}/board/elements/{element_id}
#[tracing::instrument(skip(state))]
pub async fn delete_element(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, element_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, CampaignError> {
    let mut tx = state.db.begin().await?;

    require_campaign_action(&mut tx, auth.actor(), campaign_id, Action::DeleteElement).await?;

    let board = fetch_board(&mut tx, campaign_id, false).await?;
    let result = sqlx::query("DELETE FROM board_elements WHERE id = $1 AND board_id = $2")
        .bind(element_id)
        .bind(board.id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CampaignError::ElementNotFound);
    }

    tx.commit().await?;

    info!(campaign_id = %campaign_id, element_id = %element_id, "Board element deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::campaigns::types::{BoardDimensions, BoardElementType};
    use crate::permissions::VisibilityRule;

    fn board() -> Board {
        Board {
            id: Uuid::now_v7(),
            campaign_id: Uuid::now_v7(),
            name: "Main board".into(),
            background_image_url: None,
            dimensions: SqlJson(BoardDimensions::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn element(is_visible: bool, rule: VisibilityRule) -> BoardElement {
        BoardElement {
            id: Uuid::now_v7(),
            board_id: Uuid::now_v7(),
            element_type: BoardElementType::Monster,
            character_id: None,
            game_item_id: None,
            image_url: None,
            content: SqlJson(serde_json::Map::new()),
            position: SqlJson(ElementPosition::default()),
            is_visible,
            visible_to: SqlJson(rule),
            created_by: Uuid::now_v7(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn player(id: Uuid, character_ids: Vec<Uuid>) -> Viewer {
        Viewer {
            user_id: id,
            is_gm: false,
            character_ids,
        }
    }

    #[test]
    fn test_player_list_rule() {
        let p2 = Uuid::now_v7();
        let p3 = Uuid::now_v7();
        let p5 = Uuid::now_v7();
        let elements = vec![element(true, VisibilityRule::PlayerIds(vec![p2, p3]))];

        let seen = filter_board(board(), elements.clone(), &player(p2, vec![]));
        assert_eq!(seen.elements.len(), 1);

        let unseen = filter_board(board(), elements.clone(), &player(p5, vec![]));
        assert!(unseen.elements.is_empty());

        let gm = Viewer {
            user_id: Uuid::now_v7(),
            is_gm: true,
            character_ids: vec![],
        };
        assert_eq!(filter_board(board(), elements, &gm).elements.len(), 1);
    }

    #[test]
    fn test_character_rule() {
        let hero = Uuid::now_v7();
        let elements = vec![element(true, VisibilityRule::CharacterIds(vec![hero]))];

        let owner = player(Uuid::now_v7(), vec![Uuid::now_v7(), hero]);
        assert_eq!(filter_board(board(), elements.clone(), &owner).elements.len(), 1);

        let other = player(Uuid::now_v7(), vec![Uuid::now_v7()]);
        assert!(filter_board(board(), elements, &other).elements.is_empty());
    }

    #[test]
    fn test_hidden_elements_absent_from_payload() {
        let viewer = player(Uuid::now_v7(), vec![]);
        let hidden = element(false, VisibilityRule::All);
        let hidden_id = hidden.id;
        let shown = element(true, VisibilityRule::All);

        let filtered = filter_board(board(), vec![hidden, shown], &viewer);
        let payload = serde_json::to_string(&filtered).unwrap();

        assert_eq!(filtered.elements.len(), 1);
        assert!(!payload.contains(&hidden_id.to_string()));
    }

    #[test]
    fn test_gm_sees_everything_untouched() {
        let gm = Viewer {
            user_id: Uuid::now_v7(),
            is_gm: true,
            character_ids: vec![],
        };
        let elements = vec![
            element(false, VisibilityRule::GmOnly),
            element(true, VisibilityRule::PlayerIds(vec![])),
            element(true, VisibilityRule::All),
        ];
        let ids: Vec<Uuid> = elements.iter().map(|e| e.id).collect();

        let filtered = filter_board(board(), elements, &gm);
        let kept: Vec<Uuid> = filtered.elements.iter().map(|e| e.id).collect();
        assert_eq!(kept, ids);
    }

    #[test]
    fn test_stored_garbage_rule_hides_element() {
        let rule: VisibilityRule = serde_json::from_value(json!({})).unwrap();
        let filtered = filter_board(
            board(),
            vec![element(true, rule)],
            &player(Uuid::now_v7(), vec![]),
        );
        assert!(filtered.elements.is_empty());
    }
}
