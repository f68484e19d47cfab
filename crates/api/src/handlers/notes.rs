//! Handlers for the `/notes` resource.
//!
//! Upload is a multipart coordinator: validate, store the file, insert the
//! metadata row, attach tags, then hand the note to the extraction pipeline.
//! The stored object is the source of truth; if the metadata insert fails
//! after the object was written, the object is deleted best-effort and the
//! orphan is logged if that cleanup fails too.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use moondance_core::error::CoreError;
use moondance_core::roles::ROLE_ADMIN;
use moondance_core::types::DbId;
use moondance_core::upload::{validate_title, validate_upload};
use moondance_db::models::lookup::NoteType;
use moondance_db::models::note::{CreateNote, Note, NoteView, UpdateNote};
use moondance_db::repositories::{CourseSessionRepo, NoteRepo, TagRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// The `metadata` part of the upload multipart body.
#[derive(Debug, Deserialize)]
pub struct UploadMetadata {
    pub title: String,
    pub description: Option<String>,
    pub note_type_id: i16,
    pub course_session_id: DbId,
    pub week_label: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for PATCH. Absent fields are left unchanged; `tags`
/// replaces the full tag set when present.
#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub note_type_id: Option<i16>,
    pub week_label: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Query parameters for the course-session listing.
#[derive(Debug, Deserialize)]
pub struct ListNotesParams {
    pub course_session_id: DbId,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paging parameters for the own-uploads listing.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A page of notes plus the total matching the filter.
#[derive(Debug, Serialize)]
pub struct NotePage {
    pub items: Vec<NoteView>,
    pub total: i64,
}

/// Typed response for the presigned URL endpoints.
#[derive(Debug, Serialize)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_in_secs: u64,
}

/// Typed response for the requeue endpoint.
#[derive(Debug, Serialize)]
pub struct RequeueResult {
    pub note_id: DbId,
    pub status: &'static str,
}

/// POST /api/v1/notes
///
/// Multipart upload with two parts: `metadata` (JSON, see [`UploadMetadata`])
/// and `file` (the document itself).
pub async fn upload_note(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<NoteView>>)> {
    let mut metadata: Option<UploadMetadata> = None;
    let mut file_bytes: Option<bytes::Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut mime_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let part_name = field.name().map(|s| s.to_string());
        match part_name.as_deref() {
            Some("metadata") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let parsed: UploadMetadata = serde_json::from_str(&raw)
                    .map_err(|e| AppError::BadRequest(format!("Invalid metadata: {e}")))?;
                metadata = Some(parsed);
            }
            Some("file") => {
                file_name = field.file_name().map(|s| s.to_string());
                mime_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file_bytes = Some(data);
            }
            // Unknown parts are ignored rather than rejected.
            _ => {}
        }
    }

    let metadata =
        metadata.ok_or_else(|| AppError::BadRequest("Missing 'metadata' part".to_string()))?;
    let file_bytes =
        file_bytes.ok_or_else(|| AppError::BadRequest("Missing 'file' part".to_string()))?;
    let mime_type = mime_type.unwrap_or_else(|| "application/octet-stream".to_string());

    validate_title(&metadata.title)?;
    validate_upload(file_bytes.len(), file_bytes.len() as i64, &mime_type)?;

    if NoteType::from_id(metadata.note_type_id).is_none() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown note type id: {}",
            metadata.note_type_id
        ))));
    }
    if !CourseSessionRepo::exists(&state.pool, metadata.course_session_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "CourseSession",
            id: metadata.course_session_id,
        }));
    }

    let original_name = file_name.unwrap_or_else(|| "upload".to_string());
    let stored = state
        .store
        .put(file_bytes, &mime_type, &original_name)
        .await?;

    let created = NoteRepo::create(
        &state.pool,
        &CreateNote {
            title: metadata.title,
            description: metadata.description,
            note_type_id: metadata.note_type_id,
            file_key: stored.key.clone(),
            file_hash: stored.content_hash,
            file_size: stored.size,
            mime_type,
            original_file_name: Some(original_name),
            week_label: metadata.week_label,
            course_session_id: metadata.course_session_id,
            uploader_id: user.user_id,
        },
    )
    .await;

    let note = match created {
        Ok(note) => note,
        Err(e) => {
            // The object was already written; remove it so a failed insert
            // does not leak storage. If removal fails as well, log the key
            // so an operator can reclaim it.
            if let Err(cleanup) = state.store.delete(&stored.key).await {
                tracing::error!(
                    file_key = %stored.key,
                    error = %cleanup,
                    "Orphaned object left in storage after failed note insert",
                );
            }
            return Err(e.into());
        }
    };

    let tags = attach_tags(&state, note.id, &metadata.tags).await?;

    // A full backlog is not an upload failure: the note stays pending and
    // the startup scan will pick it up.
    if let Err(e) = state.pipeline.submit(note.id) {
        tracing::warn!(note_id = note.id, error = %e, "Extraction submission deferred");
    }

    tracing::info!(note_id = note.id, uploader_id = user.user_id, "Note uploaded");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: NoteView::from_note(note, tags),
        }),
    ))
}

/// GET /api/v1/notes?course_session_id={id}
///
/// Page of active notes for a course session, newest first. Listing a note
/// does not count as a view.
pub async fn list_notes(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ListNotesParams>,
) -> AppResult<Json<DataResponse<NotePage>>> {
    if !CourseSessionRepo::exists(&state.pool, params.course_session_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "CourseSession",
            id: params.course_session_id,
        }));
    }

    let notes = NoteRepo::list_by_course_session(
        &state.pool,
        params.course_session_id,
        params.limit,
        params.offset,
    )
    .await?;
    let total = NoteRepo::count_by_course_session(&state.pool, params.course_session_id).await?;

    Ok(Json(DataResponse {
        data: NotePage {
            items: views_with_tags(&state, notes).await?,
            total,
        },
    }))
}

/// GET /api/v1/notes/mine
///
/// Page of the caller's own uploads, newest first.
pub async fn my_notes(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<DataResponse<NotePage>>> {
    let notes =
        NoteRepo::list_by_uploader(&state.pool, user.user_id, params.limit, params.offset).await?;
    let total = NoteRepo::count_by_uploader(&state.pool, user.user_id).await?;

    Ok(Json(DataResponse {
        data: NotePage {
            items: views_with_tags(&state, notes).await?,
            total,
        },
    }))
}

/// GET /api/v1/notes/{id}
///
/// Fetch a note and count the view.
pub async fn get_note(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<NoteView>>> {
    let mut note = find_active(&state, id).await?;
    NoteRepo::increment_view_count(&state.pool, id).await?;
    note.view_count += 1;

    let tags = TagRepo::names_for_note(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: NoteView::from_note(note, tags),
    }))
}

/// PATCH /api/v1/notes/{id}
///
/// Update user-editable metadata. Owner only.
pub async fn update_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateNoteRequest>,
) -> AppResult<Json<DataResponse<NoteView>>> {
    let note = find_active(&state, id).await?;
    if note.uploader_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the uploader can edit this note".into(),
        )));
    }

    if let Some(ref title) = input.title {
        validate_title(title)?;
    }
    if let Some(type_id) = input.note_type_id {
        if NoteType::from_id(type_id).is_none() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown note type id: {type_id}"
            ))));
        }
    }

    let updated = NoteRepo::update_metadata(
        &state.pool,
        id,
        &UpdateNote {
            title: input.title,
            description: input.description,
            note_type_id: input.note_type_id,
            week_label: input.week_label,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "Note", id }))?;

    let tags = match input.tags {
        Some(names) => attach_tags(&state, id, &names).await?,
        None => TagRepo::names_for_note(&state.pool, id).await?,
    };
    Ok(Json(DataResponse {
        data: NoteView::from_note(updated, tags),
    }))
}

/// DELETE /api/v1/notes/{id}
///
/// Tombstone a note. Owner or admin. The stored object is kept; history
/// (votes, reports) stays intact behind the tombstone.
pub async fn delete_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let note = find_active(&state, id).await?;
    if note.uploader_id != user.user_id && user.role != ROLE_ADMIN {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the uploader or an admin can delete this note".into(),
        )));
    }

    if NoteRepo::soft_delete(&state.pool, id).await? {
        tracing::info!(note_id = id, deleted_by = user.user_id, "Note deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "Note", id }))
    }
}

/// GET /api/v1/notes/{id}/download-url
///
/// Presigned attachment URL. Counts as a download.
pub async fn download_url(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PresignedUrl>>> {
    let note = find_active(&state, id).await?;
    let filename = note
        .original_file_name
        .as_deref()
        .unwrap_or("note")
        .to_string();

    let url = state
        .store
        .presign_download(&note.file_key, &filename, state.config.presign_ttl())
        .await?;
    NoteRepo::increment_download_count(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: PresignedUrl {
            url,
            expires_in_secs: state.config.presign_ttl_secs,
        },
    }))
}

/// GET /api/v1/notes/{id}/view-url
///
/// Presigned inline URL for the in-browser viewer. Does not count as a
/// download.
pub async fn view_url(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PresignedUrl>>> {
    let note = find_active(&state, id).await?;

    let url = state
        .store
        .presign_get(&note.file_key, state.config.presign_ttl())
        .await?;

    Ok(Json(DataResponse {
        data: PresignedUrl {
            url,
            expires_in_secs: state.config.presign_ttl_secs,
        },
    }))
}

/// POST /api/v1/notes/{id}/requeue
///
/// Reset a note to pending and resubmit it to the extraction pipeline.
/// Admin only; used to replay failed extractions.
pub async fn requeue_note(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<RequeueResult>>)> {
    if !state.pipeline.requeue(id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Note", id }));
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: RequeueResult {
                note_id: id,
                status: "pending",
            },
        }),
    ))
}

// ── Private helpers ──────────────────────────────────────────────────────

/// Fetch an active note or 404.
async fn find_active(state: &AppState, id: DbId) -> Result<Note, AppError> {
    NoteRepo::find_active_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Note", id }))
}

/// Attach tag names to each note in a listing page.
async fn views_with_tags(state: &AppState, notes: Vec<Note>) -> Result<Vec<NoteView>, AppError> {
    let mut views = Vec::with_capacity(notes.len());
    for note in notes {
        let tags = TagRepo::names_for_note(&state.pool, note.id).await?;
        views.push(NoteView::from_note(note, tags));
    }
    Ok(views)
}

/// Resolve tag names and replace the note's tag set with them. Returns the
/// canonical (deduped, trimmed) names actually attached; an empty list
/// clears the tags.
async fn attach_tags(
    state: &AppState,
    note_id: DbId,
    names: &[String],
) -> Result<Vec<String>, AppError> {
    let tags = TagRepo::resolve_names(&state.pool, names).await?;
    let ids: Vec<DbId> = tags.iter().map(|t| t.id).collect();
    TagRepo::set_note_tags(&state.pool, note_id, &ids).await?;
    Ok(tags.into_iter().map(|t| t.name).collect())
}
