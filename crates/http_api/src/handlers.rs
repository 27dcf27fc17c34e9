use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use app_api::ContextPingRequest;

use crate::{errors::HttpError, state::HttpState};

pub async fn context_ping(
    State(state): State<HttpState>,
    payload: Result<Json<ContextPingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = payload?;
    let context = state.context.clone();
    let response = tokio::task::spawn_blocking(move || app_api::context_ping(&context, req))
        .await
        .map_err(|err| {
            HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None)
        })??;
    Ok(Json(response))
}

pub async fn health() -> impl IntoResponse {
    Json(app_api::health())
}

pub async fn ready(State(state): State<HttpState>) -> Result<impl IntoResponse, HttpError> {
    let context = state.context.clone();
    let response = tokio::task::spawn_blocking(move || app_api::ready(&context))
        .await
        .map_err(|err| {
            HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None)
        })?
        .map_err(|err| {
            HttpError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                err.to_string(),
                Some("store_unavailable".to_string()),
            )
        })?;
    Ok(Json(response))
}

pub async fn not_found() -> HttpError {
    HttpError::new(
        StatusCode::NOT_FOUND,
        "Not Found",
        Some("not_found".to_string()),
    )
}
