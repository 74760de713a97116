//! File handlers: retrieval, listing and file manager integration.

use super::ListDownloadsQuery;
use crate::api::AppState;
use crate::error::Error;
use crate::types::{ListDownloadsResponse, OpenResponse};
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// `Content-Disposition` value for a download of `name`
///
/// Carries an ASCII fallback plus the RFC 5987 UTF-8 form.
pub fn attachment_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}

/// GET /files/*path - Download a file from the download directory
#[utoipa::path(
    get,
    path = "/files/{path}",
    tag = "files",
    params(
        ("path" = String, Path, description = "Path relative to the download directory")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 403, description = "Path escapes the download directory", body = crate::error::ApiError),
        (status = 404, description = "File not found", body = crate::error::ApiError)
    )
)]
pub async fn get_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let file_path = match state.downloader.file_path(&path) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let file = match tokio::fs::File::open(&file_path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Error::NotFound(path).into_response();
        }
        Err(e) => {
            tracing::error!(path = %file_path.display(), error = %e, "Failed to open file");
            return Error::Io(e).into_response();
        }
    };

    let length = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(e) => return Error::Io(e).into_response(),
    };

    let name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let disposition = HeaderValue::from_str(&attachment_disposition(&name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(length)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

/// GET /list_downloads - List files in the download directory, newest first
#[utoipa::path(
    get,
    path = "/list_downloads",
    tag = "files",
    params(ListDownloadsQuery),
    responses(
        (status = 200, description = "Files directly under the download directory", body = ListDownloadsResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_downloads(
    State(state): State<AppState>,
    Query(query): Query<ListDownloadsQuery>,
) -> Response {
    match state.downloader.list_downloads(query.limit).await {
        Ok(files) => (StatusCode::OK, Json(ListDownloadsResponse { files })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list download directory");
            e.into_response()
        }
    }
}

/// POST /open_downloads - Open the download directory in the file manager
#[utoipa::path(
    post,
    path = "/open_downloads",
    tag = "files",
    responses(
        (status = 200, description = "File manager launched", body = OpenResponse),
        (status = 500, description = "File manager could not be launched", body = OpenResponse)
    )
)]
pub async fn open_downloads(State(state): State<AppState>) -> Response {
    open_outcome(state.downloader.open_downloads().await)
}

/// POST /reveal/*path - Reveal a file in the file manager
#[utoipa::path(
    post,
    path = "/reveal/{path}",
    tag = "files",
    params(
        ("path" = String, Path, description = "Path relative to the download directory")
    ),
    responses(
        (status = 200, description = "File manager launched", body = OpenResponse),
        (status = 403, description = "Path escapes the download directory", body = crate::error::ApiError),
        (status = 500, description = "File manager could not be launched", body = OpenResponse)
    )
)]
pub async fn reveal_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    match state.downloader.reveal(&path).await {
        Err(e @ Error::ForbiddenPath { .. }) => e.into_response(),
        other => open_outcome(other),
    }
}

fn open_outcome(result: crate::Result<()>) -> Response {
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(OpenResponse {
                ok: true,
                error: None,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "File manager request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(OpenResponse {
                    ok: false,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}
