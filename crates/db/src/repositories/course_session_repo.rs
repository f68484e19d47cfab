//! Repository for the `course_sessions` table.
//!
//! The course catalog proper is an external collaborator; the ingestion path
//! only needs an existence check for the foreign-key relation.

use moondance_core::types::DbId;
use sqlx::PgPool;

/// Answers existence checks against the course catalog.
pub struct CourseSessionRepo;

impl CourseSessionRepo {
    /// True if the course session exists and is not tombstoned.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM course_sessions WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }
}
