//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).

use sqlx::PgExecutor;
use uuid::Uuid;

use super::models::User;
use crate::permissions::GlobalRole;

// ============================================================================
// User Queries
// ============================================================================

/// Find user by ID.
pub async fn find_user_by_id<'e, E>(executor: E, id: Uuid) -> sqlx::Result<Option<User>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r"
        SELECT id, email, display_name, global_role, is_active, created_at, updated_at
        FROM users
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(db_error!("find_user_by_id", user_id = %id))
}

/// Create a user. Used by seeding and tests; accounts normally come from the
/// identity service.
pub async fn create_user<'e, E>(
    executor: E,
    display_name: &str,
    email: Option<&str>,
    global_role: GlobalRole,
) -> sqlx::Result<User>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r"
        INSERT INTO users (id, email, display_name, global_role)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, display_name, global_role, is_active, created_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(email)
    .bind(display_name)
    .bind(global_role)
    .fetch_one(executor)
    .await
    .map_err(db_error!("create_user", display_name = display_name))
}

/// Change a user's global role.
///
/// Returns `None` if the user does not exist.
pub async fn set_global_role<'e, E>(
    executor: E,
    user_id: Uuid,
    global_role: GlobalRole,
) -> sqlx::Result<Option<User>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r"
        UPDATE users
        SET global_role = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, email, display_name, global_role, is_active, created_at, updated_at
        ",
    )
    .bind(user_id)
    .bind(global_role)
    .fetch_optional(executor)
    .await
    .map_err(db_error!("set_global_role", user_id = %user_id))
}
