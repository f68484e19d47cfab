//! Shared fixtures for repository integration tests.

use moondance_core::types::DbId;
use moondance_db::models::lookup::NoteType;
use moondance_db::models::note::{CreateNote, Note};
use moondance_db::repositories::NoteRepo;
use sqlx::PgPool;

/// Insert a user row and return its id.
pub async fn seed_user(pool: &PgPool, email: &str) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO users (email, display_name) VALUES ($1, $2) RETURNING id",
    )
    .bind(email)
    .bind(email.split('@').next().unwrap())
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert a course session row and return its id.
pub async fn seed_course_session(pool: &PgPool) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO course_sessions (course_code, term_label) \
         VALUES ('CS-201', 'Fall 2025') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Create a note owned by `uploader_id` in the given course session.
pub async fn seed_note(pool: &PgPool, uploader_id: DbId, course_session_id: DbId) -> Note {
    NoteRepo::create(
        pool,
        &CreateNote {
            title: "Graph algorithms, week 5".to_string(),
            description: Some("BFS, DFS, shortest paths".to_string()),
            note_type_id: NoteType::LectureNotes.id(),
            file_key: format!("notes/{uploader_id}-{course_session_id}-fixture.pdf"),
            file_hash: "0".repeat(64),
            file_size: 10_240,
            mime_type: "application/pdf".to_string(),
            original_file_name: Some("week5.pdf".to_string()),
            week_label: Some("W5".to_string()),
            course_session_id,
            uploader_id,
        },
    )
    .await
    .unwrap()
}

/// Seed one user, one course session, and one note. Returns (user, note).
pub async fn seed_basic(pool: &PgPool) -> (DbId, Note) {
    let user_id = seed_user(pool, "uploader@example.edu").await;
    let session_id = seed_course_session(pool).await;
    let note = seed_note(pool, user_id, session_id).await;
    (user_id, note)
}
