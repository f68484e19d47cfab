//! End-to-end pipeline tests against Postgres and an in-memory object store.

mod common;

use std::time::Duration;

use moondance_db::models::lookup::NoteStatus;
use moondance_db::repositories::NoteRepo;
use moondance_pipeline::{ExtractionPipeline, PipelineConfig, SubmitError};
use moondance_storage::ObjectStore;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use common::{memory_store, seed_stored_note, wait_until_settled};

const PDF_PAYLOAD: &[u8] =
    b"%PDF-1.4\x00\x01(Dijkstra relaxes every edge in priority order)\x02stream\xff";

fn test_config() -> PipelineConfig {
    PipelineConfig {
        workers: 2,
        backlog: 16,
        job_timeout: Duration::from_secs(5),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pdf_note_becomes_ready_with_text(pool: PgPool) {
    let (store, dyn_store) = memory_store();
    let note = seed_stored_note(&pool, &store, PDF_PAYLOAD, "application/pdf", "week5.pdf").await;
    assert_eq!(note.status_id, NoteStatus::Pending.id());

    let cancel = CancellationToken::new();
    let pipeline = ExtractionPipeline::start(pool.clone(), dyn_store, test_config(), cancel.clone());
    pipeline.submit(note.id).unwrap();

    let settled = wait_until_settled(&pool, note.id).await;
    assert_eq!(settled.status_id, NoteStatus::Ready.id());
    let text = settled.extracted_text.unwrap();
    assert!(text.contains("Dijkstra relaxes every edge"));
    cancel.cancel();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn image_note_becomes_ready_without_text(pool: PgPool) {
    let (store, dyn_store) = memory_store();
    let note =
        seed_stored_note(&pool, &store, b"\x89PNG\r\n\x1a\n....", "image/png", "diagram.png").await;

    let cancel = CancellationToken::new();
    let pipeline = ExtractionPipeline::start(pool.clone(), dyn_store, test_config(), cancel.clone());
    pipeline.submit(note.id).unwrap();

    let settled = wait_until_settled(&pool, note.id).await;
    assert_eq!(settled.status_id, NoteStatus::Ready.id());
    assert_eq!(settled.extracted_text, None);
    cancel.cancel();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_object_marks_failed(pool: PgPool) {
    let (store, dyn_store) = memory_store();
    let note = seed_stored_note(&pool, &store, PDF_PAYLOAD, "application/pdf", "week5.pdf").await;
    store.delete(&note.file_key).await.unwrap();

    let cancel = CancellationToken::new();
    let pipeline = ExtractionPipeline::start(pool.clone(), dyn_store, test_config(), cancel.clone());
    pipeline.submit(note.id).unwrap();

    let settled = wait_until_settled(&pool, note.id).await;
    assert_eq!(settled.status_id, NoteStatus::Failed.id());
    cancel.cancel();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_submissions_settle_once(pool: PgPool) {
    let (store, dyn_store) = memory_store();
    let note = seed_stored_note(&pool, &store, PDF_PAYLOAD, "application/pdf", "week5.pdf").await;

    let cancel = CancellationToken::new();
    let pipeline = ExtractionPipeline::start(pool.clone(), dyn_store, test_config(), cancel.clone());
    pipeline.submit(note.id).unwrap();
    pipeline.submit(note.id).unwrap();
    pipeline.submit(note.id).unwrap();

    // The first claim wins; the redundant jobs find the note no longer
    // pending and drop out without another transition.
    let settled = wait_until_settled(&pool, note.id).await;
    assert_eq!(settled.status_id, NoteStatus::Ready.id());
    assert!(settled.extracted_text.is_some());
    cancel.cancel();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn startup_recovery_resets_orphans(pool: PgPool) {
    let (store, dyn_store) = memory_store();
    let orphan = seed_stored_note(&pool, &store, PDF_PAYLOAD, "application/pdf", "week5.pdf").await;

    // Simulate a crash mid-job: the note was claimed but never finished.
    assert!(NoteRepo::mark_processing(&pool, orphan.id).await.unwrap());

    let cancel = CancellationToken::new();
    let pipeline = ExtractionPipeline::start(pool.clone(), dyn_store, test_config(), cancel.clone());
    let report = pipeline.recover_on_startup().await.unwrap();
    assert_eq!(report.orphans_reset, 1);
    assert_eq!(report.resubmitted, 1);

    let settled = wait_until_settled(&pool, orphan.id).await;
    assert_eq!(settled.status_id, NoteStatus::Ready.id());
    cancel.cancel();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn requeue_replays_a_failed_note(pool: PgPool) {
    let (store, dyn_store) = memory_store();
    let note = seed_stored_note(&pool, &store, PDF_PAYLOAD, "application/pdf", "week5.pdf").await;

    store.set_unavailable(true);
    let cancel = CancellationToken::new();
    let pipeline = ExtractionPipeline::start(pool.clone(), dyn_store, test_config(), cancel.clone());
    pipeline.submit(note.id).unwrap();
    let settled = wait_until_settled(&pool, note.id).await;
    assert_eq!(settled.status_id, NoteStatus::Failed.id());

    // Outage over: an explicit requeue replays the job from scratch.
    store.set_unavailable(false);
    assert!(pipeline.requeue(note.id).await.unwrap());
    let settled = wait_until_settled(&pool, note.id).await;
    assert_eq!(settled.status_id, NoteStatus::Ready.id());
    cancel.cancel();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn requeue_unknown_note_reports_missing(pool: PgPool) {
    let (_store, dyn_store) = memory_store();
    let cancel = CancellationToken::new();
    let pipeline = ExtractionPipeline::start(pool.clone(), dyn_store, test_config(), cancel.clone());
    assert!(!pipeline.requeue(999_999).await.unwrap());
    cancel.cancel();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn full_backlog_rejects_submission(pool: PgPool) {
    let (store, dyn_store) = memory_store();
    let first = seed_stored_note(&pool, &store, PDF_PAYLOAD, "application/pdf", "week5.pdf").await;

    // No workers draining, capacity one: the second submission must be
    // rejected rather than queued without bound.
    let config = PipelineConfig {
        workers: 0,
        backlog: 1,
        job_timeout: Duration::from_secs(5),
    };
    let cancel = CancellationToken::new();
    let pipeline = ExtractionPipeline::start(pool.clone(), dyn_store, config, cancel.clone());

    pipeline.submit(first.id).unwrap();
    match pipeline.submit(first.id) {
        Err(SubmitError::BacklogFull) => {}
        other => panic!("expected BacklogFull, got {other:?}"),
    }

    // The note itself is untouched: still pending, recoverable by the
    // startup scan.
    let note = NoteRepo::find_any_by_id(&pool, first.id).await.unwrap().unwrap();
    assert_eq!(note.status_id, NoteStatus::Pending.id());
    cancel.cancel();
}
