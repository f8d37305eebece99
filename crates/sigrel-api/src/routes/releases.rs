//! # Release Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET  | `/api/{component}/{channel}/{os}/{arch}/json` | [`current_metadata`] |
//! | GET  | `/api/{component}/{channel}/{os}/{arch}/{version}/getbinary` | [`get_binary`] |
//! | POST | `/api/{component}/{channel}/{os}/{arch}/{version}/uploadbinary` | [`upload_binary`] |
//!
//! Uploads stream each multipart part straight into a staging area; the
//! publish transaction then verifies and commits it.

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use sigrel_core::{Coordinate, FileName, PointerMetadata, Version};
use sigrel_store::{StagedWriter, StagingArea};
use tokio_util::io::ReaderStream;

use super::blocking;
use crate::error::AppError;
use crate::state::AppState;

/// Build the release router.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/{component}/{channel}/{os}/{arch}/json",
            get(current_metadata),
        )
        .route(
            "/api/{component}/{channel}/{os}/{arch}/{version}/getbinary",
            get(get_binary),
        )
        .route(
            "/api/{component}/{channel}/{os}/{arch}/{version}/uploadbinary",
            post(upload_binary).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

/// GET the coordinate's current pointer metadata.
#[utoipa::path(
    get,
    path = "/api/{component}/{channel}/{os}/{arch}/json",
    params(
        ("component" = String, Path, description = "Component name"),
        ("channel" = String, Path, description = "Release channel"),
        ("os" = String, Path, description = "Operating system"),
        ("arch" = String, Path, description = "Architecture"),
    ),
    responses(
        (status = 200, description = "Current pointer: {version, checksum, path}"),
        (status = 400, description = "Invalid coordinate", body = crate::error::ErrorBody),
        (status = 404, description = "Nothing published yet", body = crate::error::ErrorBody),
    ),
    tag = "releases"
)]
async fn current_metadata(
    State(state): State<AppState>,
    Path((component, channel, os, arch)): Path<(String, String, String, String)>,
) -> Result<Json<PointerMetadata>, AppError> {
    let coordinate = Coordinate::new(&component, &channel, &os, &arch)?;
    let query = state.workspace.query();
    let metadata = blocking(move || query.current_metadata(&coordinate)).await?;
    Ok(Json(metadata))
}

/// GET a stored binary. `version` may be `latest`.
#[utoipa::path(
    get,
    path = "/api/{component}/{channel}/{os}/{arch}/{version}/getbinary",
    params(
        ("component" = String, Path, description = "Component name"),
        ("channel" = String, Path, description = "Release channel"),
        ("os" = String, Path, description = "Operating system"),
        ("arch" = String, Path, description = "Architecture"),
        ("version" = String, Path, description = "Version, or `latest`"),
    ),
    responses(
        (status = 200, description = "Binary stream (application/octet-stream)"),
        (status = 404, description = "Unknown coordinate or version", body = crate::error::ErrorBody),
        (status = 500, description = "Pointer names missing content", body = crate::error::ErrorBody),
    ),
    tag = "releases"
)]
async fn get_binary(
    State(state): State<AppState>,
    Path((component, channel, os, arch, version)): Path<(String, String, String, String, String)>,
) -> Result<Response, AppError> {
    let coordinate = Coordinate::new(&component, &channel, &os, &arch)?;
    let selector = Version::parse_selector(&version)?;
    let query = state.workspace.query();
    let content = blocking(move || query.open_binary(&coordinate, selector.as_ref())).await?;

    let stream = ReaderStream::new(tokio::fs::File::from_std(content.file));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, content.len)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", content.file_name),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("failed to build response: {e}")))
}

/// POST a signed binary as multipart/form-data fields `file` (the binary)
/// and `sign` (the detached DER signature).
#[utoipa::path(
    post,
    path = "/api/{component}/{channel}/{os}/{arch}/{version}/uploadbinary",
    params(
        ("component" = String, Path, description = "Component name"),
        ("channel" = String, Path, description = "Release channel"),
        ("os" = String, Path, description = "Operating system"),
        ("arch" = String, Path, description = "Architecture"),
        ("version" = String, Path, description = "Version to publish"),
    ),
    responses(
        (status = 201, description = "Verified and published"),
        (status = 400, description = "Malformed upload or untrusted signature", body = crate::error::ErrorBody),
        (status = 409, description = "Version already published", body = crate::error::ErrorBody),
    ),
    tag = "releases"
)]
async fn upload_binary(
    State(state): State<AppState>,
    Path((component, channel, os, arch, version)): Path<(String, String, String, String, String)>,
    mut multipart: Multipart,
) -> Result<StatusCode, AppError> {
    let coordinate = Coordinate::new(&component, &channel, &os, &arch)?;
    let version = Version::new(version)?;

    let workspace = state.workspace.clone();
    let mut staging = blocking(move || workspace.stage()).await?;
    if let Err(e) = fill_staging(&mut multipart, &mut staging).await {
        if let Err(join) = tokio::task::spawn_blocking(move || staging.close()).await {
            tracing::warn!(error = %join, "staging cleanup task failed");
        }
        return Err(e);
    }

    let metadata = state
        .workspace
        .publisher()
        .publish(coordinate.clone(), version, staging)
        .await?;
    tracing::info!(
        coordinate = %coordinate,
        version = %metadata.version,
        checksum = %metadata.checksum,
        "release published"
    );
    Ok(StatusCode::CREATED)
}

/// Stream the `file` and `sign` parts into `staging`. Other fields are
/// skipped.
async fn fill_staging(multipart: &mut Multipart, staging: &mut StagingArea) -> Result<(), AppError> {
    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        let writer = match name.as_deref() {
            Some("file") => {
                let file_name = FileName::from_upload(field.file_name())?;
                staging.binary_writer(file_name).await?
            }
            Some("sign") => staging.signature_writer().await?,
            other => {
                tracing::debug!(field = ?other, "ignoring unknown multipart field");
                continue;
            }
        };
        drain_field(&mut field, writer).await?;
    }
    Ok(())
}

async fn drain_field(
    field: &mut axum::extract::multipart::Field<'_>,
    mut writer: StagedWriter,
) -> Result<u64, AppError> {
    while let Some(chunk) = field.chunk().await? {
        writer.write_chunk(&chunk).await?;
    }
    Ok(writer.finish().await?)
}
