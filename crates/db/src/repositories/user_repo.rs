//! Repository for the `users` table.

use moondance_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::User;

/// Column list for `users` queries.
const USER_COLUMNS: &str =
    "id, email, display_name, role, is_banned, created_at, updated_at, deleted_at";

/// Resolves caller identities to active user records.
pub struct UserRepo;

impl UserRepo {
    /// Find a user that is neither tombstoned nor banned.
    ///
    /// Any caller without an active record is treated as unauthenticated by
    /// the API layer.
    pub async fn find_active_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE id = $1 AND deleted_at IS NULL AND NOT is_banned"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
