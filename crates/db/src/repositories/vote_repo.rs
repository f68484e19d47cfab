//! Repository for the `votes` table and the vote aggregation engine.
//!
//! Both mutations here follow the same shape inside one transaction:
//! lock the note row (`SELECT ... FOR UPDATE`), mutate the vote set, then
//! recompute the note's denormalized aggregates from the full vote set and
//! overwrite them. The row lock serializes concurrent mutations per note
//! (recompute-then-store is not commutative), while mutations on different
//! notes never contend. The recompute is a full scan, not an incremental
//! delta, so interleavings always converge to the correct value.

use moondance_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::vote::{Vote, VoteAggregates};

/// Column list for `votes` queries.
const VOTE_COLUMNS: &str = "id, note_id, user_id, value, rating, created_at, updated_at";

/// Outcome of a vote removal.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveVoteOutcome {
    /// The note does not exist (or is tombstoned).
    NoteMissing,
    /// The caller had no vote on this note.
    VoteMissing,
    /// The vote was deleted; aggregates were recomputed.
    Removed(VoteAggregates),
}

/// Provides vote mutations with per-note serialized aggregate recomputation.
pub struct VoteRepo;

impl VoteRepo {
    /// Cast or replace the caller's vote on a note, then recompute the note's
    /// aggregates.
    ///
    /// The upsert on `(note_id, user_id)` makes a second vote from the same
    /// user a replacement, never a duplicate. Returns `None` when the note
    /// does not exist or is tombstoned.
    pub async fn cast_vote(
        pool: &PgPool,
        note_id: DbId,
        user_id: DbId,
        value: i32,
        rating: Option<i32>,
    ) -> Result<Option<(Vote, VoteAggregates)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !Self::lock_note(&mut tx, note_id).await? {
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO votes (note_id, user_id, value, rating) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT ON CONSTRAINT uq_votes_note_user \
             DO UPDATE SET value = EXCLUDED.value, \
                           rating = COALESCE(EXCLUDED.rating, votes.rating), \
                           updated_at = NOW() \
             RETURNING {VOTE_COLUMNS}"
        );
        let vote = sqlx::query_as::<_, Vote>(&query)
            .bind(note_id)
            .bind(user_id)
            .bind(value)
            .bind(rating)
            .fetch_one(&mut *tx)
            .await?;

        let aggregates = Self::recompute_aggregates(&mut tx, note_id).await?;

        tx.commit().await?;
        Ok(Some((vote, aggregates)))
    }

    /// Delete the caller's vote on a note, then recompute the note's
    /// aggregates. The vote row is removed entirely, not zeroed.
    pub async fn remove_vote(
        pool: &PgPool,
        note_id: DbId,
        user_id: DbId,
    ) -> Result<RemoveVoteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !Self::lock_note(&mut tx, note_id).await? {
            return Ok(RemoveVoteOutcome::NoteMissing);
        }

        let result = sqlx::query("DELETE FROM votes WHERE note_id = $1 AND user_id = $2")
            .bind(note_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(RemoveVoteOutcome::VoteMissing);
        }

        let aggregates = Self::recompute_aggregates(&mut tx, note_id).await?;

        tx.commit().await?;
        Ok(RemoveVoteOutcome::Removed(aggregates))
    }

    /// The caller's current vote on a note, if any.
    pub async fn find_user_vote(
        pool: &PgPool,
        note_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Vote>, sqlx::Error> {
        let query =
            format!("SELECT {VOTE_COLUMNS} FROM votes WHERE note_id = $1 AND user_id = $2");
        sqlx::query_as::<_, Vote>(&query)
            .bind(note_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Number of vote rows for a note. Test/diagnostic helper.
    pub async fn count_for_note(pool: &PgPool, note_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM votes WHERE note_id = $1")
            .bind(note_id)
            .fetch_one(pool)
            .await
    }

    /// Take the per-note row lock. Returns `false` for absent or tombstoned
    /// notes.
    async fn lock_note(
        tx: &mut Transaction<'_, Postgres>,
        note_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let locked: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM notes WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(note_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(locked.is_some())
    }

    /// Recompute aggregates from the full vote set and overwrite the note's
    /// denormalized fields. Must run inside the locking transaction.
    async fn recompute_aggregates(
        tx: &mut Transaction<'_, Postgres>,
        note_id: DbId,
    ) -> Result<VoteAggregates, sqlx::Error> {
        let aggregates = sqlx::query_as::<_, VoteAggregates>(
            "SELECT \
                COALESCE(SUM(CASE WHEN value > 0 THEN 1 \
                                  WHEN value < 0 THEN -1 \
                                  ELSE 0 END), 0)::int4 AS vote_count, \
                COALESCE(AVG(rating)::float8, 0.0) AS average_rating \
             FROM votes WHERE note_id = $1",
        )
        .bind(note_id)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "UPDATE notes SET vote_count = $2, average_rating = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(note_id)
        .bind(aggregates.vote_count)
        .bind(aggregates.average_rating)
        .execute(&mut **tx)
        .await?;

        Ok(aggregates)
    }
}
