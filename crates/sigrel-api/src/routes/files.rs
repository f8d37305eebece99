//! # Content Browsing
//!
//! `GET /files/{*path}` lists a directory of the content tree as JSON
//! `[{name, is_directory}]`, or returns a stored file verbatim as
//! `application/octet-stream`. `GET /` redirects here.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use sigrel_store::Browse;
use tokio_util::io::ReaderStream;

use super::blocking;
use crate::error::AppError;
use crate::state::AppState;

/// Build the browsing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/files", get(browse_root))
        .route("/files/", get(browse_root))
        .route("/files/{*path}", get(browse_path))
}

async fn index() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/files")]).into_response()
}

/// List the top of the content tree.
#[utoipa::path(
    get,
    path = "/files",
    responses((status = 200, description = "Directory listing")),
    tag = "files"
)]
async fn browse_root(State(state): State<AppState>) -> Result<Response, AppError> {
    browse(state, String::new()).await
}

/// List a directory or download a file below the content root.
#[utoipa::path(
    get,
    path = "/files/{path}",
    params(("path" = String, Path, description = "Slash-separated path under the content root")),
    responses(
        (status = 200, description = "Directory listing or raw file"),
        (status = 404, description = "No such path", body = crate::error::ErrorBody),
    ),
    tag = "files"
)]
async fn browse_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    browse(state, path).await
}

async fn browse(state: AppState, path: String) -> Result<Response, AppError> {
    let artifacts = state.workspace.artifacts().clone();
    match blocking(move || artifacts.browse(&path)).await? {
        Browse::Directory(entries) => Ok(Json(entries).into_response()),
        Browse::File { file, len } => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, len)
            .body(Body::from_stream(ReaderStream::new(tokio::fs::File::from_std(file))))
            .map_err(|e| AppError::Internal(format!("failed to build response: {e}"))),
    }
}
