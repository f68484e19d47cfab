//! Repository for the `tags` and `note_tags` tables.
//!
//! Tag creation is idempotent: resolving a name that already exists reuses
//! the existing row. Concurrent creation races collapse onto the same row
//! via `ON CONFLICT`.

use moondance_core::types::DbId;
use sqlx::PgPool;

use crate::models::tag::Tag;

/// Column list for `tags` queries.
const TAG_COLUMNS: &str = "id, name, created_at";

/// Provides idempotent tag resolution and note-tag associations.
pub struct TagRepo;

impl TagRepo {
    /// Resolve tag names to rows, creating any that do not exist yet.
    ///
    /// Names are trimmed; empty names are skipped. The `DO UPDATE SET name =
    /// EXCLUDED.name` no-op makes `RETURNING` yield the row on the conflict
    /// path too, so a lost insert race still resolves to the winner's row.
    pub async fn resolve_names(pool: &PgPool, names: &[String]) -> Result<Vec<Tag>, sqlx::Error> {
        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let query = format!(
                "INSERT INTO tags (name) VALUES ($1) \
                 ON CONFLICT ON CONSTRAINT uq_tags_name DO UPDATE SET name = EXCLUDED.name \
                 RETURNING {TAG_COLUMNS}"
            );
            let tag = sqlx::query_as::<_, Tag>(&query)
                .bind(name)
                .fetch_one(pool)
                .await?;
            // Dedup within the request itself.
            if !tags.iter().any(|t: &Tag| t.id == tag.id) {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    /// Replace the full tag set of a note.
    pub async fn set_note_tags(
        pool: &PgPool,
        note_id: DbId,
        tag_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM note_tags WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut *tx)
            .await?;

        for tag_id in tag_ids {
            sqlx::query(
                "INSERT INTO note_tags (note_id, tag_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(note_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Tag names attached to a note, sorted for stable projections.
    pub async fn names_for_note(pool: &PgPool, note_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT t.name FROM tags t \
             JOIN note_tags nt ON nt.tag_id = t.id \
             WHERE nt.note_id = $1 ORDER BY t.name",
        )
        .bind(note_id)
        .fetch_all(pool)
        .await
    }
}
