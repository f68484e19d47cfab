//! Note entity models and DTOs.

use moondance_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::lookup::LookupId;

/// A row from the `notes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Note {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub note_type_id: LookupId,
    pub file_key: String,
    pub file_hash: String,
    pub file_size: i64,
    pub mime_type: String,
    pub original_file_name: Option<String>,
    pub thumbnail_key: Option<String>,
    pub extracted_text: Option<String>,
    pub status_id: LookupId,
    pub week_label: Option<String>,
    pub course_session_id: DbId,
    pub uploader_id: DbId,
    pub view_count: i32,
    pub download_count: i32,
    /// Positive votes minus negative votes, recomputed on every vote mutation.
    pub vote_count: i32,
    /// Mean of all non-null vote ratings; 0.0 when no ratings exist.
    pub average_rating: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// Insert payload for a new note. Status always starts at `Pending`.
#[derive(Debug, Clone)]
pub struct CreateNote {
    pub title: String,
    pub description: Option<String>,
    pub note_type_id: LookupId,
    pub file_key: String,
    pub file_hash: String,
    pub file_size: i64,
    pub mime_type: String,
    pub original_file_name: Option<String>,
    pub week_label: Option<String>,
    pub course_session_id: DbId,
    pub uploader_id: DbId,
}

/// Partial-update payload for a note's user-editable metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub description: Option<String>,
    pub note_type_id: Option<LookupId>,
    pub week_label: Option<String>,
}

/// Public projection of a note returned to API callers.
///
/// Deliberately omits `file_key`, `thumbnail_key`, and `deleted_at`; storage
/// keys never leave the backend.
#[derive(Debug, Clone, Serialize)]
pub struct NoteView {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub note_type_id: LookupId,
    pub file_hash: String,
    pub file_size: i64,
    pub mime_type: String,
    pub original_file_name: Option<String>,
    pub status_id: LookupId,
    pub week_label: Option<String>,
    pub course_session_id: DbId,
    pub uploader_id: DbId,
    pub view_count: i32,
    pub download_count: i32,
    pub vote_count: i32,
    pub average_rating: f64,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NoteView {
    /// Build the public projection from a row plus its resolved tag names.
    pub fn from_note(note: Note, tags: Vec<String>) -> Self {
        Self {
            id: note.id,
            title: note.title,
            description: note.description,
            note_type_id: note.note_type_id,
            file_hash: note.file_hash,
            file_size: note.file_size,
            mime_type: note.mime_type,
            original_file_name: note.original_file_name,
            status_id: note.status_id,
            week_label: note.week_label,
            course_session_id: note.course_session_id,
            uploader_id: note.uploader_id,
            view_count: note.view_count,
            download_count: note.download_count,
            vote_count: note.vote_count,
            average_rating: note.average_rating,
            tags,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}
