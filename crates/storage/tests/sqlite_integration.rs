use chrono::Duration;
use fold_core::model::{OptionLetter, QuestionId, QuestionOutcome, ScoreReport, SessionId};
use fold_core::time::fixed_now;
use storage::repository::{AnswerSnapshot, AnswerStore, ReportRecord, ReportStore, StorageError};
use storage::sqlite::SqliteStore;

fn build_snapshot() -> AnswerSnapshot {
    AnswerSnapshot::new(
        vec![Some(OptionLetter::A), None, Some(OptionLetter::D)],
        fixed_now(),
    )
}

fn build_record(namespace: &str, correct: u32, days_ago: i64) -> ReportRecord {
    let outcomes = vec![QuestionOutcome {
        question_index: 0,
        question_id: QuestionId::from_position(0),
        chosen: Some(OptionLetter::A),
        correct: OptionLetter::A,
        is_correct: true,
    }];
    let report = ScoreReport::from_persisted(
        SessionId::random(),
        3,
        correct,
        fixed_now() - Duration::days(days_ago),
        outcomes,
    )
    .unwrap();
    ReportRecord::from_report(namespace, &report)
}

#[tokio::test]
async fn sqlite_sheet_roundtrip_overwrite_and_clear() {
    let store = SqliteStore::connect("sqlite:file:memdb_sheets?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    let snapshot = build_snapshot();
    store.save_sheet("ns", &snapshot).await.unwrap();

    let loaded = store.load_sheet("ns").await.unwrap().expect("sheet");
    assert_eq!(loaded, snapshot);

    // overwritten wholesale on every change
    let updated = AnswerSnapshot::new(
        vec![
            Some(OptionLetter::A),
            Some(OptionLetter::B),
            Some(OptionLetter::D),
        ],
        fixed_now() + Duration::minutes(1),
    );
    store.save_sheet("ns", &updated).await.unwrap();
    let loaded = store.load_sheet("ns").await.unwrap().expect("sheet");
    assert_eq!(loaded, updated);

    store.clear_sheet("ns").await.unwrap();
    assert!(store.load_sheet("ns").await.unwrap().is_none());
    store.clear_sheet("ns").await.unwrap();
}

#[tokio::test]
async fn sqlite_sheets_are_namespaced() {
    let store = SqliteStore::connect("sqlite:file:memdb_namespaces?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    store
        .save_sheet("paperfolding_answers_demo", &build_snapshot())
        .await
        .unwrap();

    assert!(
        store
            .load_sheet("paperfolding_answers_full")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn sqlite_reports_append_get_and_list() {
    let store = SqliteStore::connect("sqlite:file:memdb_reports?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    let older = store
        .append_report(&build_record("ns", 1, 2))
        .await
        .unwrap();
    let newer = store
        .append_report(&build_record("ns", 2, 0))
        .await
        .unwrap();
    store
        .append_report(&build_record("other", 3, 0))
        .await
        .unwrap();

    let fetched = store.get_report(older).await.unwrap();
    assert_eq!(fetched.correct, 1);
    assert_eq!(fetched.outcomes.len(), 1);
    assert!(fetched.outcomes[0].is_correct);

    let listed = store.list_reports("ns", 10).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, Some(newer));
    assert_eq!(listed[1].id, Some(older));

    let limited = store.list_reports("ns", 1).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, Some(newer));

    let report = fetched.into_report().unwrap();
    assert_eq!(report.accuracy(), 33.3);

    let missing = store.get_report(9_999).await.unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));
}
