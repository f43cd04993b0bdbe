//! Campaign Module
//!
//! Campaigns live inside an organization and are run by their creator, the
//! GM. Players join through the campaign membership state machine; the GM
//! owns characters' gold and items and every change to the shared board.

pub mod board;
pub mod characters;
pub mod error;
pub mod handlers;
pub mod items;
pub mod members;
pub mod queries;
pub mod types;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::api::AppState;

pub use error::CampaignError;

/// Campaign routes, nested under `/api/campaigns`.
///
/// Creating and listing campaigns hangs off the organization router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{campaign_id}",
            get(handlers::get_campaign).patch(handlers::update_campaign),
        )
        // Membership
        .route("/{campaign_id}/join", post(members::join_campaign))
        .route("/{campaign_id}/members", get(members::list_members))
        .route(
            "/{campaign_id}/members/{user_id}/approve",
            post(members::approve_player),
        )
        .route(
            "/{campaign_id}/members/{user_id}/kick",
            post(members::kick_player),
        )
        .route(
            "/{campaign_id}/members/{user_id}/ban",
            post(members::ban_player),
        )
        // Characters
        .route(
            "/{campaign_id}/characters",
            get(characters::list_characters).post(characters::create_character),
        )
        .route(
            "/{campaign_id}/characters/{character_id}",
            patch(characters::update_own_character),
        )
        .route(
            "/{campaign_id}/characters/{character_id}/gm",
            patch(characters::gm_update_character),
        )
        .route(
            "/{campaign_id}/characters/{character_id}/gold",
            post(characters::adjust_gold),
        )
        .route(
            "/{campaign_id}/characters/{character_id}/inventory",
            get(items::get_inventory),
        )
        // Items
        .route(
            "/{campaign_id}/items",
            get(items::list_items).post(items::create_item),
        )
        .route("/{campaign_id}/items/give", post(items::give_item))
        // Board
        .route(
            "/{campaign_id}/board",
            get(board::get_board).patch(board::update_board),
        )
        .route("/{campaign_id}/board/elements", post(board::create_element))
        .route(
            "/{campaign_id}/board/elements/{element_id}",
            patch(board::update_element).delete(board::delete_element),
        )
}
