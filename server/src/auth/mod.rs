//! Authentication
//!
//! Validates access tokens issued by the identity service and resolves them to
//! an [`AuthUser`]. Login, registration and token refresh live elsewhere.

mod error;
mod handlers;
pub mod jwt;
mod middleware;

use axum::{routing::get, Router};

use crate::api::AppState;

pub use error::{AuthError, AuthResult, ErrorResponse};
pub use middleware::{require_auth, AuthUser};

/// Create authentication router.
///
/// Protected routes (auth required, applied by the caller):
/// - GET /me - Current user and global role
pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(handlers::get_profile))
}
