use std::sync::Arc;
use std::time::Duration;

use moondance_core::extract::{extract_text, is_extractable};
use moondance_core::types::DbId;
use moondance_db::repositories::NoteRepo;
use moondance_storage::ObjectStore;
use sqlx::PgPool;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// A single worker task. All workers share one receiver behind a mutex so
/// the backlog stays a single FIFO queue.
pub(crate) struct ExtractionWorker {
    pub pool: PgPool,
    pub store: Arc<dyn ObjectStore>,
    pub job_timeout: Duration,
}

impl ExtractionWorker {
    pub async fn run(
        self,
        worker_id: usize,
        rx: Arc<Mutex<mpsc::Receiver<DbId>>>,
        cancel: CancellationToken,
    ) {
        tracing::debug!(worker_id, "Extraction worker started");
        loop {
            let note_id = {
                let mut rx = rx.lock().await;
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = rx.recv() => match received {
                        Some(id) => id,
                        None => break,
                    },
                }
            };

            if let Err(e) = self.run_job(note_id).await {
                tracing::error!(worker_id, note_id, error = %e, "Extraction job failed with database error");
            }
        }
        tracing::debug!(worker_id, "Extraction worker stopped");
    }

    /// Drive one note through the state machine. Database errors bubble up;
    /// extraction and storage problems are terminal for the note, not the
    /// worker, and land it in `failed`.
    async fn run_job(&self, note_id: DbId) -> Result<(), sqlx::Error> {
        // Guarded claim: only a pending note transitions. A stale or
        // duplicate submission loses here and is dropped.
        if !NoteRepo::mark_processing(&self.pool, note_id).await? {
            tracing::debug!(note_id, "Skipping job, note is not pending");
            return Ok(());
        }

        let Some(note) = NoteRepo::find_any_by_id(&self.pool, note_id).await? else {
            tracing::warn!(note_id, "Note vanished after claim");
            return Ok(());
        };

        if !is_extractable(&note.mime_type) {
            // Nothing to extract is still a successful outcome.
            NoteRepo::mark_ready(&self.pool, note_id, None).await?;
            tracing::info!(note_id, mime_type = %note.mime_type, "Note ready, no extractable content");
            return Ok(());
        }

        let bytes = match self.store.get(&note.file_key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(note_id, file_key = %note.file_key, error = %e, "Could not fetch stored object");
                NoteRepo::mark_failed(&self.pool, note_id).await?;
                return Ok(());
            }
        };

        let mime_type = note.mime_type.clone();
        let extraction = tokio::time::timeout(
            self.job_timeout,
            tokio::task::spawn_blocking(move || extract_text(&bytes, &mime_type)),
        )
        .await;

        match extraction {
            Ok(Ok(text)) => {
                let chars = text.as_deref().map(|t| t.chars().count()).unwrap_or(0);
                NoteRepo::mark_ready(&self.pool, note_id, text.as_deref()).await?;
                tracing::info!(note_id, chars, "Note ready");
            }
            Ok(Err(join_error)) => {
                tracing::error!(note_id, error = %join_error, "Extraction task panicked");
                NoteRepo::mark_failed(&self.pool, note_id).await?;
            }
            Err(_) => {
                tracing::error!(
                    note_id,
                    timeout_secs = self.job_timeout.as_secs(),
                    "Extraction timed out",
                );
                NoteRepo::mark_failed(&self.pool, note_id).await?;
            }
        }
        Ok(())
    }
}
