use monitor_app::{AppError, AppState, PingInput};
use monitor_core::EntryId;
use tempfile::tempdir;

fn ping(task_id: &str, token_count: i64, max_tokens: Option<i64>) -> PingInput {
    PingInput {
        task_id: Some(task_id.to_string()),
        token_count: Some(token_count),
        max_tokens,
        timestamp: Some(1_700_000_000_000),
    }
}

#[test]
fn ping_service_records_into_project_stream() {
    let dir = tempdir().expect("temp dir");
    let app_state = AppState::new(dir.path().join("app.sqlite"));
    app_state.setup_db().expect("setup db");

    let receipt = app_state
        .services
        .ping
        .record(ping("proj1:taskA", 450, Some(500)))
        .expect("record");
    assert_eq!(receipt.stream_key, "context:proj1");
    assert_eq!(receipt.usage_percentage, 90.0);

    let db = app_state.open_db().expect("open db");
    let entries = db
        .read_entries_after("context:proj1", EntryId::ZERO, 10)
        .expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, receipt.entry_id);
    assert_eq!(entries[0].field("task_id"), Some("proj1:taskA"));
    assert_eq!(entries[0].field("timestamp"), Some("1700000000000"));
}

#[test]
fn invalid_ping_is_never_written() {
    let dir = tempdir().expect("temp dir");
    let app_state = AppState::new(dir.path().join("app.sqlite"));
    app_state.setup_db().expect("setup db");

    let err = app_state
        .services
        .ping
        .record(ping("proj1:taskA", 10, None))
        .expect_err("missing max_tokens");
    assert!(matches!(err, AppError::Validation(_)));

    let err = app_state
        .services
        .ping
        .record(ping("proj1:taskA", 10, Some(0)))
        .expect_err("zero max_tokens");
    assert!(matches!(err, AppError::Validation(_)));

    let db = app_state.open_db().expect("open db");
    assert_eq!(db.count_entries("context:proj1").expect("count"), 0);
}

#[test]
fn store_failure_surfaces_as_store_error() {
    let dir = tempdir().expect("temp dir");
    let app_state = AppState::new(dir.path().to_path_buf());

    let err = app_state
        .services
        .ping
        .record(ping("proj1:taskA", 10, Some(100)))
        .expect_err("directory is not a database");
    assert!(matches!(err, AppError::Store(_)));
    assert!(app_state.services.health.readiness().is_err());
}

#[test]
fn readiness_counts_streams() {
    let dir = tempdir().expect("temp dir");
    let app_state = AppState::new(dir.path().join("app.sqlite"));
    app_state.setup_db().expect("setup db");
    app_state
        .services
        .ping
        .record(ping("proj1:taskA", 1, Some(10)))
        .expect("record");
    app_state
        .services
        .ping
        .record(ping("solo", 1, Some(10)))
        .expect("record");

    let snapshot = app_state.services.health.readiness().expect("ready");
    assert_eq!(snapshot.streams, 2);
}
