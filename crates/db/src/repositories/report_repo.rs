//! Repository for the `reports` table.

use moondance_core::types::DbId;
use sqlx::PgPool;

use crate::models::lookup::ReportStatus;
use crate::models::report::{CreateReport, Report, ReviewReport};

/// Column list for `reports` queries.
const REPORT_COLUMNS: &str = "\
    id, note_id, reporter_id, reason, description, status_id, \
    moderator_notes, reviewed_by, reviewed_at, created_at, updated_at";

/// Provides moderation-report persistence.
pub struct ReportRepo;

impl ReportRepo {
    /// True if this reporter already filed a report against this note.
    pub async fn exists_for(
        pool: &PgPool,
        note_id: DbId,
        reporter_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE note_id = $1 AND reporter_id = $2",
        )
        .bind(note_id)
        .bind(reporter_id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    /// File a new report in `pending` status.
    pub async fn create(
        pool: &PgPool,
        note_id: DbId,
        reporter_id: DbId,
        input: &CreateReport,
    ) -> Result<Report, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports (note_id, reporter_id, reason, description, status_id) \
             VALUES ($1, $2, $3, $4, {pending}) \
             RETURNING {REPORT_COLUMNS}",
            pending = ReportStatus::Pending.id(),
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(note_id)
            .bind(reporter_id)
            .bind(&input.reason)
            .bind(input.description.as_deref())
            .fetch_one(pool)
            .await
    }

    /// Find a report by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1");
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All reports still awaiting review, oldest first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<Report>, sqlx::Error> {
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE status_id = $1 ORDER BY created_at"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(ReportStatus::Pending.id())
            .fetch_all(pool)
            .await
    }

    /// Move a pending report to its terminal status.
    ///
    /// Guarded on `status_id = pending`, so a second review attempt affects
    /// zero rows and returns `None`; reviewed reports are terminal.
    pub async fn review(
        pool: &PgPool,
        id: DbId,
        reviewer_id: DbId,
        input: &ReviewReport,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports SET \
                status_id = $2, moderator_notes = $3, \
                reviewed_by = $4, reviewed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id = {pending} \
             RETURNING {REPORT_COLUMNS}",
            pending = ReportStatus::Pending.id(),
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .bind(input.status_id)
            .bind(input.moderator_notes.as_deref())
            .bind(reviewer_id)
            .fetch_optional(pool)
            .await
    }
}
