//! Asynchronous content-extraction pipeline.
//!
//! A bounded worker pool pulls note ids off a bounded backlog and drives
//! each note's processing-status state machine:
//!
//! ```text
//! pending --(worker claims job)--------------------> processing
//! processing --(extraction ok, incl. "no content")--> ready
//! processing --(extraction or store write fails)----> failed
//! ```
//!
//! The pipeline is at-least-once: a job may run twice after a crash, which
//! is safe because extraction is a pure function of the stored bytes and the
//! only effect of a job is overwriting the note's derived fields. The
//! guarded `mark_processing` claim means a duplicate submission simply loses
//! the claim and walks away.
//!
//! On startup, [`ExtractionPipeline::recover_on_startup`] resets notes
//! orphaned in `processing` by a previous crash back to `pending` and
//! resubmits them, then resubmits notes that were queued but never picked
//! up. It runs before the HTTP surface accepts traffic so a freshly
//! resubmitted note cannot be scanned and submitted twice.

mod worker;

use std::sync::Arc;
use std::time::Duration;

use moondance_core::types::DbId;
use moondance_db::models::lookup::NoteStatus;
use moondance_db::repositories::NoteRepo;
use moondance_storage::ObjectStore;
use sqlx::PgPool;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Fixed number of worker tasks.
    pub workers: usize,
    /// Backlog capacity; submissions beyond it are rejected, never queued
    /// unboundedly.
    pub backlog: usize,
    /// Upper bound on a single job (object fetch + extraction). The original
    /// system had none; a pathological file could starve a pool slot
    /// forever, so jobs here are cut off and recorded as failed.
    pub job_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            backlog: 100,
            job_timeout: Duration::from_secs(120),
        }
    }
}

/// Why a submission was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The backlog is full. The note stays `pending` and will be picked up
    /// by the next startup scan; callers log this rather than surface it.
    #[error("extraction backlog is full")]
    BacklogFull,

    /// The pipeline has shut down.
    #[error("extraction pipeline is shut down")]
    ShutDown,
}

/// Counts from the startup reconciliation scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Notes found orphaned in `processing` and reset to `pending`.
    pub orphans_reset: usize,
    /// Total notes resubmitted (orphans plus already-pending).
    pub resubmitted: usize,
}

/// Bounded-concurrency extraction pipeline.
pub struct ExtractionPipeline {
    tx: mpsc::Sender<DbId>,
    // Keeps the channel open even when no worker task holds a receiver
    // clone, so the backlog accepts up to capacity regardless of pool size.
    _rx: Arc<Mutex<mpsc::Receiver<DbId>>>,
    pool: PgPool,
}

impl ExtractionPipeline {
    /// Spawn the worker pool and return the submission handle.
    ///
    /// Workers run until `cancel` fires; in-flight jobs run to completion.
    pub fn start(
        pool: PgPool,
        store: Arc<dyn ObjectStore>,
        config: PipelineConfig,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel::<DbId>(config.backlog.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..config.workers {
            let worker = worker::ExtractionWorker {
                pool: pool.clone(),
                store: Arc::clone(&store),
                job_timeout: config.job_timeout,
            };
            let rx = Arc::clone(&rx);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                worker.run(worker_id, rx, cancel).await;
            });
        }

        tracing::info!(
            workers = config.workers,
            backlog = config.backlog,
            job_timeout_secs = config.job_timeout.as_secs(),
            "Extraction pipeline started",
        );

        Arc::new(Self { tx, _rx: rx, pool })
    }

    /// Enqueue an extraction job. Non-blocking: a full backlog rejects the
    /// submission instead of applying backpressure upstream.
    pub fn submit(&self, note_id: DbId) -> Result<(), SubmitError> {
        self.tx.try_send(note_id).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                tracing::warn!(note_id, "Extraction backlog full, submission dropped");
                SubmitError::BacklogFull
            }
            mpsc::error::TrySendError::Closed(_) => SubmitError::ShutDown,
        })
    }

    /// Reset a note to `pending` and resubmit it. Admin replay for notes
    /// stuck in `failed`.
    ///
    /// Returns `false` if the note does not exist. A full backlog is logged
    /// and tolerated: the note is already `pending` again, so the next
    /// startup scan will resubmit it.
    pub async fn requeue(&self, note_id: DbId) -> Result<bool, sqlx::Error> {
        if !NoteRepo::reset_to_pending(&self.pool, note_id).await? {
            return Ok(false);
        }
        if let Err(e) = self.submit(note_id) {
            tracing::warn!(note_id, error = %e, "Requeue accepted but submission deferred");
        }
        tracing::info!(note_id, "Note requeued for extraction");
        Ok(true)
    }

    /// One-shot startup reconciliation. Must complete before normal traffic
    /// is accepted.
    ///
    /// Any note still in `processing` was orphaned by a crash mid-job; reset
    /// it to `pending` and resubmit. Any note already `pending` was queued
    /// but never picked up; resubmit as-is.
    pub async fn recover_on_startup(&self) -> Result<RecoveryReport, sqlx::Error> {
        let mut report = RecoveryReport::default();

        // Snapshot the pending set before resetting orphans, so a reset
        // orphan is not submitted a second time by the pending scan.
        let queued = NoteRepo::ids_with_status(&self.pool, NoteStatus::Pending).await?;

        let orphaned = NoteRepo::ids_with_status(&self.pool, NoteStatus::Processing).await?;
        for note_id in orphaned {
            NoteRepo::reset_to_pending(&self.pool, note_id).await?;
            report.orphans_reset += 1;
            if self.submit(note_id).is_ok() {
                report.resubmitted += 1;
            }
            tracing::info!(note_id, "Orphaned note reset to pending");
        }

        for note_id in queued {
            if self.submit(note_id).is_ok() {
                report.resubmitted += 1;
            }
        }

        tracing::info!(
            orphans_reset = report.orphans_reset,
            resubmitted = report.resubmitted,
            "Startup recovery scan complete",
        );
        Ok(report)
    }
}
