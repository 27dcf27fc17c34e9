use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use app_api::AppContext;
use monitor_app::AppState;

use crate::HttpState;

#[tokio::test]
async fn health_reports_healthy_without_store() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let app_state = AppState::new(temp_dir.path().join("missing").join("store.sqlite"));
    let state = HttpState::new(AppContext { app_state });
    let app = crate::router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}
