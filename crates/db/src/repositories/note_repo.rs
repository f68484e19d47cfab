//! Repository for the `notes` table.
//!
//! This is the sole writer of a note's processing status and aggregate
//! fields. The extraction pipeline and the vote code request changes through
//! the guarded methods here instead of touching those columns themselves,
//! which keeps every status transition single-writer even under concurrent
//! callers.

use moondance_core::types::DbId;
use sqlx::PgPool;

use crate::models::lookup::NoteStatus;
use crate::models::note::{CreateNote, Note, UpdateNote};
use crate::models::vote::VoteAggregates;

/// Column list for `notes` queries.
const NOTE_COLUMNS: &str = "\
    id, title, description, note_type_id, \
    file_key, file_hash, file_size, mime_type, original_file_name, \
    thumbnail_key, extracted_text, status_id, week_label, \
    course_session_id, uploader_id, \
    view_count, download_count, vote_count, average_rating, \
    created_at, updated_at, deleted_at";

/// Default page size for note listings.
const DEFAULT_PAGE_SIZE: i64 = 20;

/// Hard cap on a single listing page.
const MAX_PAGE_SIZE: i64 = 100;

/// Clamp caller-supplied paging values to sane bounds.
fn clamp_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        offset.unwrap_or(0).max(0),
    )
}

/// Provides CRUD, browsing, counter, and status-transition operations for
/// notes.
pub struct NoteRepo;

impl NoteRepo {
    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Insert a new note. Processing status always starts at `pending`.
    pub async fn create(pool: &PgPool, input: &CreateNote) -> Result<Note, sqlx::Error> {
        let query = format!(
            "INSERT INTO notes (\
                title, description, note_type_id, \
                file_key, file_hash, file_size, mime_type, original_file_name, \
                week_label, course_session_id, uploader_id, status_id\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, {pending}) \
             RETURNING {NOTE_COLUMNS}",
            pending = NoteStatus::Pending.id(),
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(&input.title)
            .bind(input.description.as_deref())
            .bind(input.note_type_id)
            .bind(&input.file_key)
            .bind(&input.file_hash)
            .bind(input.file_size)
            .bind(&input.mime_type)
            .bind(input.original_file_name.as_deref())
            .bind(input.week_label.as_deref())
            .bind(input.course_session_id)
            .bind(input.uploader_id)
            .fetch_one(pool)
            .await
    }

    /// Find a non-tombstoned note by ID.
    pub async fn find_active_by_id(pool: &PgPool, id: DbId) -> Result<Option<Note>, sqlx::Error> {
        let query =
            format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a note by ID regardless of tombstone state. Admin lookups only.
    pub async fn find_any_by_id(pool: &PgPool, id: DbId) -> Result<Option<Note>, sqlx::Error> {
        let query = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1");
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update user-editable metadata on an active note.
    pub async fn update_metadata(
        pool: &PgPool,
        id: DbId,
        input: &UpdateNote,
    ) -> Result<Option<Note>, sqlx::Error> {
        let query = format!(
            "UPDATE notes SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                note_type_id = COALESCE($4, note_type_id), \
                week_label = COALESCE($5, week_label), \
                updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {NOTE_COLUMNS}"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .bind(input.title.as_deref())
            .bind(input.description.as_deref())
            .bind(input.note_type_id)
            .bind(input.week_label.as_deref())
            .fetch_optional(pool)
            .await
    }

    /// Tombstone a note. Returns `false` if it was already tombstoned or absent.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Browsing
    // -----------------------------------------------------------------------
    //
    // Listing queries only ever see active notes. Ordering is newest first
    // with the id as a tiebreak so pages are stable.

    /// Page of active notes for a course session.
    pub async fn list_by_course_session(
        pool: &PgPool,
        course_session_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Note>, sqlx::Error> {
        let (limit, offset) = clamp_page(limit, offset);
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM notes \
             WHERE course_session_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(course_session_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total active notes for a course session.
    pub async fn count_by_course_session(
        pool: &PgPool,
        course_session_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notes WHERE course_session_id = $1 AND deleted_at IS NULL",
        )
        .bind(course_session_id)
        .fetch_one(pool)
        .await
    }

    /// Page of a user's own active uploads.
    pub async fn list_by_uploader(
        pool: &PgPool,
        uploader_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Note>, sqlx::Error> {
        let (limit, offset) = clamp_page(limit, offset);
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM notes \
             WHERE uploader_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(uploader_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total active notes uploaded by a user.
    pub async fn count_by_uploader(pool: &PgPool, uploader_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notes WHERE uploader_id = $1 AND deleted_at IS NULL",
        )
        .bind(uploader_id)
        .fetch_one(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Monotonic counters
    // -----------------------------------------------------------------------

    /// Atomically bump the view counter.
    pub async fn increment_view_count(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE notes SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Atomically bump the download counter.
    pub async fn increment_download_count(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE notes SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Processing-status state machine
    // -----------------------------------------------------------------------
    //
    // Every transition is a conditional UPDATE guarded on the current status,
    // so a stale or duplicate caller simply affects zero rows instead of
    // corrupting the lifecycle.

    /// Claim a pending note for processing (`pending` -> `processing`).
    ///
    /// Returns `false` when the note is not currently `pending`, including
    /// when a concurrent worker already claimed it.
    pub async fn mark_processing(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(NoteStatus::Processing.id())
        .bind(NoteStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Finish processing successfully (`processing` -> `ready`), storing the
    /// extracted text. `None` means the media type was not extractable, which
    /// is still success.
    pub async fn mark_ready(
        pool: &PgPool,
        id: DbId,
        extracted_text: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET status_id = $2, extracted_text = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(NoteStatus::Ready.id())
        .bind(extracted_text)
        .bind(NoteStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record an extraction failure (`processing` -> `failed`).
    pub async fn mark_failed(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(NoteStatus::Failed.id())
        .bind(NoteStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reset a note to `pending` from any status. Used by crash recovery
    /// (orphaned `processing` rows) and by explicit requeue. Tombstoned
    /// notes are left alone and report `false`.
    pub async fn reset_to_pending(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(NoteStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// IDs of all non-tombstoned notes currently in the given status.
    /// Powers the startup reconciliation scan.
    pub async fn ids_with_status(
        pool: &PgPool,
        status: NoteStatus,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM notes WHERE status_id = $1 AND deleted_at IS NULL ORDER BY id",
        )
        .bind(status.id())
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    /// Current denormalized vote aggregates for a note.
    pub async fn aggregates(pool: &PgPool, id: DbId) -> Result<Option<VoteAggregates>, sqlx::Error> {
        sqlx::query_as::<_, VoteAggregates>(
            "SELECT vote_count, average_rating FROM notes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
