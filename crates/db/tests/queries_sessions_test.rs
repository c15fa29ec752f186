// Integration tests for focus-session merge and streak calculation through
// the database.

use chrono::NaiveDate;
use focusflow_core::{start_of_day, NewFocusSession, NewTask, SessionType};
use focusflow_db::Database;
use pretty_assertions::assert_eq;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn setup() -> (Database, i64, i64) {
    let db = Database::new_in_memory().await.unwrap();
    let user = db
        .create_user("ada@example.com", "Ada", "hash")
        .await
        .unwrap();
    let task = db
        .create_task(
            user.id,
            &NewTask {
                title: "Write chapter 3".into(),
                project: Some("Thesis".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    (db, user.id, task.id)
}

/// Start and immediately end a focus session on `task_id`.
async fn focus(db: &Database, user_id: i64, task_id: Option<i64>, start: i64, end: i64) -> i64 {
    let session = db
        .start_session(
            user_id,
            &NewFocusSession {
                task_id,
                started_at: Some(start),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    db.end_session(user_id, session.id, Some(end)).await.unwrap();
    session.id
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ---------------------------------------------------------------------------
// Contiguous merge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn merge_30s_gap_collapses_into_one() {
    let (db, uid, tid) = setup().await;
    let first = focus(&db, uid, Some(tid), 10_000, 10_600).await;
    focus(&db, uid, Some(tid), 10_630, 11_230).await;

    let report = db.merge_contiguous_sessions(uid, tid).await.unwrap().unwrap();
    assert_eq!(report.groups, 1);
    assert_eq!(report.removed, 1);
    assert_eq!(report.sessions.len(), 1);

    let merged = &report.sessions[0];
    assert_eq!(merged.id, first);
    assert_eq!(merged.started_at, 10_000);
    assert_eq!(merged.ended_at, Some(11_230));
    assert_eq!(merged.duration_seconds, Some(1_200));
}

#[tokio::test]
async fn merge_120s_gap_keeps_both() {
    let (db, uid, tid) = setup().await;
    focus(&db, uid, Some(tid), 10_000, 10_600).await;
    focus(&db, uid, Some(tid), 10_720, 11_320).await;

    let report = db.merge_contiguous_sessions(uid, tid).await.unwrap().unwrap();
    assert_eq!(report.groups, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(report.sessions.len(), 2);
}

#[tokio::test]
async fn merge_is_idempotent() {
    let (db, uid, tid) = setup().await;
    focus(&db, uid, Some(tid), 10_000, 10_600).await;
    focus(&db, uid, Some(tid), 10_610, 11_000).await;
    focus(&db, uid, Some(tid), 11_050, 11_500).await;

    let first = db.merge_contiguous_sessions(uid, tid).await.unwrap().unwrap();
    assert_eq!(first.removed, 2);

    let second = db.merge_contiguous_sessions(uid, tid).await.unwrap().unwrap();
    assert_eq!(second.groups, 0);
    assert_eq!(second.removed, 0);
    assert_eq!(second.sessions, first.sessions);
}

#[tokio::test]
async fn merge_ignores_breaks_and_other_tasks() {
    let (db, uid, tid) = setup().await;
    let other = db
        .create_task(
            uid,
            &NewTask {
                title: "Other".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    focus(&db, uid, Some(tid), 10_000, 10_600).await;
    focus(&db, uid, Some(other.id), 10_610, 11_000).await;
    let brk = db
        .start_session(
            uid,
            &NewFocusSession {
                session_type: SessionType::ShortBreak,
                task_id: Some(tid),
                started_at: Some(10_620),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    db.end_session(uid, brk.id, Some(10_900)).await.unwrap();

    let report = db.merge_contiguous_sessions(uid, tid).await.unwrap().unwrap();
    assert_eq!(report.removed, 0);
}

#[tokio::test]
async fn merge_on_foreign_task_is_none() {
    let (db, _uid, tid) = setup().await;
    let bob = db.create_user("bob@example.com", "Bob", "hash").await.unwrap();
    assert!(db.merge_contiguous_sessions(bob.id, tid).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Streaks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn streak_three_consecutive_days() {
    let (db, uid, tid) = setup().await;
    let today = day("2025-06-15");
    for offset in 0..3 {
        let start = start_of_day(today - chrono::Duration::days(offset)) + 9 * 3600;
        focus(&db, uid, Some(tid), start, start + 30 * 60).await;
    }

    let streak = db.streak(uid, today).await.unwrap();
    assert_eq!(streak.current, 3);
    assert_eq!(streak.longest, 3);
    assert_eq!(streak.today_minutes, 30);
    assert!(streak.qualifies_today);
}

#[tokio::test]
async fn streak_gap_breaks_chain() {
    let (db, uid, tid) = setup().await;
    let today = day("2025-06-15");
    for offset in [0, 2] {
        let start = start_of_day(today - chrono::Duration::days(offset)) + 9 * 3600;
        focus(&db, uid, Some(tid), start, start + 30 * 60).await;
    }
    assert_eq!(db.streak(uid, today).await.unwrap().current, 1);
}

#[tokio::test]
async fn streak_sums_short_sessions_within_a_day() {
    let (db, uid, tid) = setup().await;
    let today = day("2025-06-15");
    let start = start_of_day(today) + 8 * 3600;
    // Three 10-minute sessions, far enough apart to stay separate.
    for i in 0..3 {
        let s = start + i * 3600;
        focus(&db, uid, Some(tid), s, s + 600).await;
    }
    let streak = db.streak(uid, today).await.unwrap();
    assert_eq!(streak.today_minutes, 30);
    assert_eq!(streak.current, 1);
}

#[tokio::test]
async fn streak_anchored_on_yesterday() {
    let (db, uid, tid) = setup().await;
    let today = day("2025-06-15");
    for offset in [1, 2] {
        let start = start_of_day(today - chrono::Duration::days(offset)) + 9 * 3600;
        focus(&db, uid, Some(tid), start, start + 25 * 60).await;
    }
    let streak = db.streak(uid, today).await.unwrap();
    assert_eq!(streak.current, 2);
    assert!(!streak.qualifies_today);
}

#[tokio::test]
async fn streak_below_threshold_is_zero() {
    let (db, uid, tid) = setup().await;
    let today = day("2025-06-15");
    let start = start_of_day(today) + 9 * 3600;
    focus(&db, uid, Some(tid), start, start + 24 * 60).await;
    assert_eq!(db.streak(uid, today).await.unwrap().current, 0);
}

// ---------------------------------------------------------------------------
// Breakdowns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn project_breakdown_groups_unassigned_sessions() {
    let (db, uid, tid) = setup().await;
    let today = day("2025-06-15");
    let start = start_of_day(today) + 9 * 3600;
    focus(&db, uid, Some(tid), start, start + 40 * 60).await;
    focus(&db, uid, None, start + 7200, start + 7200 + 20 * 60).await;

    let projects = db.project_breakdown(uid, today, today).await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].project, "Thesis");
    assert_eq!(projects[0].minutes, 40);
    assert_eq!(projects[1].project, focusflow_db::NO_PROJECT);
    assert_eq!(projects[1].minutes, 20);
}

#[tokio::test]
async fn daily_totals_zero_fill() {
    let (db, uid, tid) = setup().await;
    let today = day("2025-06-15");
    let start = start_of_day(today - chrono::Duration::days(2)) + 3600;
    focus(&db, uid, Some(tid), start, start + 50 * 60).await;

    let totals = db
        .daily_focus_totals(uid, day("2025-06-12"), today)
        .await
        .unwrap();
    let minutes: Vec<i64> = totals.iter().map(|d| d.minutes).collect();
    assert_eq!(minutes, vec![0, 50, 0, 0]);
    assert_eq!(totals[1].day, "2025-06-13");
}
