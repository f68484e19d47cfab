//! Shared fixtures for pipeline integration tests.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use moondance_core::types::DbId;
use moondance_db::models::lookup::{NoteStatus, NoteType};
use moondance_db::models::note::{CreateNote, Note};
use moondance_db::repositories::NoteRepo;
use moondance_storage::{MemoryObjectStore, ObjectStore};
use sqlx::PgPool;

/// Insert a user and course session, returning (user_id, course_session_id).
pub async fn seed_owner(pool: &PgPool) -> (DbId, DbId) {
    let user_id: DbId = sqlx::query_scalar(
        "INSERT INTO users (email, display_name) VALUES ('uploader@example.edu', 'uploader') \
         RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    let session_id: DbId = sqlx::query_scalar(
        "INSERT INTO course_sessions (course_code, term_label) \
         VALUES ('CS-201', 'Fall 2025') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    (user_id, session_id)
}

/// Store `payload` in the object store and create a pending note pointing
/// at the stored key.
pub async fn seed_stored_note(
    pool: &PgPool,
    store: &MemoryObjectStore,
    payload: &'static [u8],
    mime_type: &str,
    original_name: &str,
) -> Note {
    let (user_id, session_id) = seed_owner(pool).await;
    let stored = store
        .put(Bytes::from_static(payload), mime_type, original_name)
        .await
        .unwrap();
    NoteRepo::create(
        pool,
        &CreateNote {
            title: "Graph algorithms, week 5".to_string(),
            description: None,
            note_type_id: NoteType::LectureNotes.id(),
            file_key: stored.key,
            file_hash: stored.content_hash,
            file_size: stored.size,
            mime_type: mime_type.to_string(),
            original_file_name: Some(original_name.to_string()),
            week_label: Some("W5".to_string()),
            course_session_id: session_id,
            uploader_id: user_id,
        },
    )
    .await
    .unwrap()
}

/// Poll until the note leaves `pending`/`processing`, then return it.
/// Panics if it has not settled within a couple of seconds.
pub async fn wait_until_settled(pool: &PgPool, note_id: DbId) -> Note {
    for _ in 0..100 {
        let note = NoteRepo::find_any_by_id(pool, note_id).await.unwrap().unwrap();
        if note.status_id != NoteStatus::Pending.id()
            && note.status_id != NoteStatus::Processing.id()
        {
            return note;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("note {note_id} never settled");
}

/// A fresh in-memory object store behind the trait object the pipeline takes.
pub fn memory_store() -> (Arc<MemoryObjectStore>, Arc<dyn ObjectStore>) {
    let store = Arc::new(MemoryObjectStore::new());
    let dyn_store: Arc<dyn ObjectStore> = Arc::clone(&store) as Arc<dyn ObjectStore>;
    (store, dyn_store)
}
