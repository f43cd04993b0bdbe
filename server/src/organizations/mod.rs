//! Organization Management Module
//!
//! Organizations group users and own campaigns. Handles creation, join
//! requests, approval and role changes.

pub mod error;
pub mod handlers;
pub mod types;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::api::AppState;
use crate::campaigns;

pub use error::OrganizationError;

/// Create the organization router with all endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_organization))
        .route("/mine", get(handlers::list_my_organizations))
        .route(
            "/{org_id}",
            get(handlers::get_organization).patch(handlers::update_organization),
        )
        .route("/{org_id}/join", post(handlers::join_organization))
        .route("/{org_id}/members", get(handlers::list_members))
        .route(
            "/{org_id}/members/{user_id}/approve",
            post(handlers::approve_member),
        )
        .route(
            "/{org_id}/members/{user_id}/role",
            patch(handlers::change_member_role),
        )
        .route(
            "/{org_id}/campaigns",
            get(campaigns::handlers::list_campaigns).post(campaigns::handlers::create_campaign),
        )
}
