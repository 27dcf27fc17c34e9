use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use app_api::AppContext;
use monitor_app::AppState;
use monitor_core::EntryId;
use monitor_db::Db;

use http_api::HttpState;

struct TestApp {
    _temp_dir: tempfile::TempDir,
    db_path: std::path::PathBuf,
    router: axum::Router,
}

fn build_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let db_path = temp_dir.path().join("monitor.sqlite");
    let app_state = AppState::new(db_path.clone());
    app_state.setup_db().expect("setup db");

    let state = HttpState::new(AppContext { app_state });
    let router = http_api::router(state);

    TestApp {
        _temp_dir: temp_dir,
        db_path,
        router,
    }
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request")
}

async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let payload: Value = serde_json::from_slice(&body).expect("json body");
    (status, payload)
}

fn stream_len(db_path: &std::path::Path, stream_key: &str) -> usize {
    let db = Db::open(db_path).expect("open db");
    db.read_entries_after(stream_key, EntryId::ZERO, 1000)
        .expect("entries")
        .len()
}

#[tokio::test]
async fn context_ping_appends_to_project_stream() {
    let app = build_app();

    let (status, payload) = send(
        &app.router,
        post_json(
            "/context-ping",
            json!({"task_id": "proj1:taskA", "token_count": 450, "max_tokens": 500})
                .to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "success");
    assert_eq!(payload["message"], "Context data recorded");
    assert_eq!(payload["stream_key"], "context:proj1");
    let entry_id: EntryId = payload["entry_id"]
        .as_str()
        .expect("entry id string")
        .parse()
        .expect("entry id");

    let db = Db::open(&app.db_path).expect("open db");
    let entries = db
        .read_entries_after("context:proj1", EntryId::ZERO, 10)
        .expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, entry_id);
    assert_eq!(entries[0].field("usage_percentage"), Some("90"));
    assert!(entries[0].field("timestamp").is_some());
}

#[tokio::test]
async fn task_without_project_goes_to_default_stream() {
    let app = build_app();

    let (status, payload) = send(
        &app.router,
        post_json(
            "/context-ping",
            json!({"task_id": "loner", "token_count": 1, "max_tokens": 4, "timestamp": 17})
                .to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["stream_key"], "context:default");
    assert_eq!(stream_len(&app.db_path, "context:default"), 1);
}

#[tokio::test]
async fn missing_max_tokens_is_rejected_without_writing() {
    let app = build_app();

    let (status, payload) = send(
        &app.router,
        post_json(
            "/context-ping",
            json!({"task_id": "proj1:taskA", "token_count": 450}).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["detail"], "Missing required field: max_tokens");
    assert_eq!(stream_len(&app.db_path, "context:proj1"), 0);
}

#[tokio::test]
async fn non_positive_max_tokens_is_rejected() {
    let app = build_app();

    for max_tokens in [0, -5] {
        let (status, payload) = send(
            &app.router,
            post_json(
                "/context-ping",
                json!({"task_id": "proj1:taskA", "token_count": 1, "max_tokens": max_tokens})
                    .to_string(),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["code"], "validation_error");
    }
    assert_eq!(stream_len(&app.db_path, "context:proj1"), 0);
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let app = build_app();

    let (status, payload) = send(
        &app.router,
        post_json("/context-ping", "{not json".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["detail"], "Invalid JSON payload");

    let (status, _) = send(
        &app.router,
        post_json(
            "/context-ping",
            json!({"task_id": "a", "token_count": "many", "max_tokens": 10}).to_string(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_failure_is_a_server_error() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let app_state = AppState::new(temp_dir.path().to_path_buf());
    let router = http_api::router(HttpState::new(AppContext { app_state }));

    let (status, payload) = send(
        &router,
        post_json(
            "/context-ping",
            json!({"task_id": "proj1:taskA", "token_count": 1, "max_tokens": 10}).to_string(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload["code"], "store_error");
    assert!(payload["detail"].as_str().is_some());

    let (status, _) = send(
        &router,
        Request::builder()
            .uri("/ready")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, payload) = send(
        &router,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload, json!({"status": "healthy"}));
}

#[tokio::test]
async fn ready_reports_stream_count() {
    let app = build_app();
    send(
        &app.router,
        post_json(
            "/context-ping",
            json!({"task_id": "proj9:x", "token_count": 1, "max_tokens": 10}).to_string(),
        ),
    )
    .await;

    let (status, payload) = send(
        &app.router,
        Request::builder()
            .uri("/ready")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "ready");
    assert_eq!(payload["streams"], 1);
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let app = build_app();
    let (status, payload) = send(
        &app.router,
        Request::builder()
            .uri("/nope")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["code"], "not_found");
}
