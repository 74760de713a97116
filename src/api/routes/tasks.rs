//! Task handlers.

use crate::api::AppState;
use crate::types::{DispatchResponse, DownloadRequest, TaskId};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /download - Dispatch a download job
///
/// The body is parsed leniently: a missing or malformed JSON body is treated
/// as an empty request and rejected for its missing `url`.
#[utoipa::path(
    post,
    path = "/download",
    tag = "tasks",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Task created; poll /status/{task_id}", body = DispatchResponse),
        (status = 400, description = "No URL given", body = crate::error::ApiError)
    )
)]
pub async fn start_download(State(state): State<AppState>, body: Bytes) -> Response {
    let request: DownloadRequest = serde_json::from_slice(&body).unwrap_or_default();

    match state.downloader.submit(&request) {
        Ok(task_id) => (StatusCode::OK, Json(DispatchResponse { task_id })).into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected download request");
            e.into_response()
        }
    }
}

/// GET /status/:task_id - Poll a task
#[utoipa::path(
    get,
    path = "/status/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task ID returned by POST /download")
    ),
    responses(
        (status = 200, description = "Task snapshot", body = crate::types::TaskSnapshot),
        (status = 404, description = "Unknown task", body = crate::error::ApiError)
    )
)]
pub async fn get_status(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    match state.downloader.status(&TaskId::from(task_id)) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /tasks - List every task, newest first
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "Summaries of all tasks", body = Vec<crate::types::TaskSummary>)
    )
)]
pub async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.downloader.list_tasks()))
}
