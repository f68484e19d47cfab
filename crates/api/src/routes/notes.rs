//! Route definitions for the note catalog.
//!
//! Mounted at `/notes`.
//!
//! ```text
//! POST   /                   -> upload_note (multipart)
//! GET    /?course_session_id -> list_notes (paged)
//! GET    /mine               -> my_notes (paged)
//! GET    /{id}               -> get_note
//! PATCH  /{id}               -> update_note (owner)
//! DELETE /{id}               -> delete_note (owner or admin)
//! GET    /{id}/download-url  -> download_url
//! GET    /{id}/view-url      -> view_url
//! POST   /{id}/requeue       -> requeue_note (admin)
//! PUT    /{id}/vote          -> cast_vote
//! DELETE /{id}/vote          -> remove_vote
//! GET    /{id}/vote          -> get_own_vote
//! POST   /{id}/reports       -> create_report
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{notes, reports, votes};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(notes::upload_note).get(notes::list_notes))
        .route("/mine", get(notes::my_notes))
        .route(
            "/{id}",
            get(notes::get_note)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/{id}/download-url", get(notes::download_url))
        .route("/{id}/view-url", get(notes::view_url))
        .route("/{id}/requeue", post(notes::requeue_note))
        .route(
            "/{id}/vote",
            get(votes::get_own_vote)
                .put(votes::cast_vote)
                .delete(votes::remove_vote),
        )
        .route("/{id}/reports", post(reports::create_report))
}
