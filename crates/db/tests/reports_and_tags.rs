//! Integration tests for moderation reports and idempotent tag resolution.

mod common;

use common::{seed_basic, seed_user};
use moondance_db::models::lookup::ReportStatus;
use moondance_db::models::report::{CreateReport, ReviewReport};
use moondance_db::repositories::{NoteRepo, ReportRepo, TagRepo};
use sqlx::PgPool;

fn spam_report() -> CreateReport {
    CreateReport {
        reason: "spam".to_string(),
        description: Some("advertising, not course material".to_string()),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn report_starts_pending_and_is_unique_per_reporter(pool: PgPool) {
    let (_, note) = seed_basic(&pool).await;
    let reporter = seed_user(&pool, "reporter@example.edu").await;

    assert!(!ReportRepo::exists_for(&pool, note.id, reporter).await.unwrap());

    let report = ReportRepo::create(&pool, note.id, reporter, &spam_report())
        .await
        .unwrap();
    assert_eq!(report.status_id, ReportStatus::Pending.id());

    assert!(ReportRepo::exists_for(&pool, note.id, reporter).await.unwrap());

    // The uq_reports_note_reporter constraint rejects a second insert.
    let dup = ReportRepo::create(&pool, note.id, reporter, &spam_report()).await;
    assert!(dup.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn resolving_a_report_tombstones_the_note(pool: PgPool) {
    let (_, note) = seed_basic(&pool).await;
    let reporter = seed_user(&pool, "reporter@example.edu").await;
    let moderator = seed_user(&pool, "moderator@example.edu").await;

    let report = ReportRepo::create(&pool, note.id, reporter, &spam_report())
        .await
        .unwrap();

    let reviewed = ReportRepo::review(
        &pool,
        report.id,
        moderator,
        &ReviewReport {
            status_id: ReportStatus::Resolved.id(),
            moderator_notes: Some("confirmed spam".to_string()),
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(reviewed.status_id, ReportStatus::Resolved.id());
    assert_eq!(reviewed.reviewed_by, Some(moderator));

    // The resolution side effect is applied by the handler; mirror it here.
    NoteRepo::soft_delete(&pool, note.id).await.unwrap();
    assert!(NoteRepo::find_active_by_id(&pool, note.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_is_terminal(pool: PgPool) {
    let (_, note) = seed_basic(&pool).await;
    let reporter = seed_user(&pool, "reporter@example.edu").await;
    let moderator = seed_user(&pool, "moderator@example.edu").await;

    let report = ReportRepo::create(&pool, note.id, reporter, &spam_report())
        .await
        .unwrap();

    let dismiss = ReviewReport {
        status_id: ReportStatus::Dismissed.id(),
        moderator_notes: None,
    };
    assert!(ReportRepo::review(&pool, report.id, moderator, &dismiss)
        .await
        .unwrap()
        .is_some());

    // Second review attempt affects zero rows.
    assert!(ReportRepo::review(&pool, report.id, moderator, &dismiss)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn tag_resolution_is_idempotent(pool: PgPool) {
    let names = vec!["graphs".to_string(), "midterm".to_string()];

    let first = TagRepo::resolve_names(&pool, &names).await.unwrap();
    let second = TagRepo::resolve_names(&pool, &names).await.unwrap();

    assert_eq!(first.len(), 2);
    let first_ids: Vec<_> = first.iter().map(|t| t.id).collect();
    let second_ids: Vec<_> = second.iter().map(|t| t.id).collect();
    assert_eq!(first_ids, second_ids);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_and_duplicate_names_are_collapsed(pool: PgPool) {
    let names = vec![
        "  graphs ".to_string(),
        "graphs".to_string(),
        "   ".to_string(),
    ];
    let tags = TagRepo::resolve_names(&pool, &names).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "graphs");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_note_tags_replaces_the_full_set(pool: PgPool) {
    let (_, note) = seed_basic(&pool).await;

    let first = TagRepo::resolve_names(&pool, &["graphs".to_string(), "bfs".to_string()])
        .await
        .unwrap();
    let ids: Vec<_> = first.iter().map(|t| t.id).collect();
    TagRepo::set_note_tags(&pool, note.id, &ids).await.unwrap();

    let replacement = TagRepo::resolve_names(&pool, &["exam".to_string()]).await.unwrap();
    let ids: Vec<_> = replacement.iter().map(|t| t.id).collect();
    TagRepo::set_note_tags(&pool, note.id, &ids).await.unwrap();

    let names = TagRepo::names_for_note(&pool, note.id).await.unwrap();
    assert_eq!(names, vec!["exam".to_string()]);
}
