//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every non-2xx response carries exactly `{"code": ..., "error": ...}`.
//! Internal error details are logged, never returned.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use sigrel_store::StoreError;
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error kind (e.g. "NOT_FOUND", "UNTRUSTED_ARTIFACT").
    pub code: String,
    /// Human-readable message.
    pub error: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown coordinate, version or path (404).
    #[error("{0}")]
    NotFound(String),

    /// Malformed request input (400).
    #[error("{0}")]
    Validation(String),

    /// Password mismatch or key registration disabled (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Signature not valid for any trusted key (400).
    #[error("{0}")]
    Untrusted(String),

    /// Duplicate key or already-published version (409).
    #[error("{0}")]
    Conflict(String),

    /// Storage or internal failure (500). Message is logged, not returned.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Untrusted(_) => (StatusCode::BAD_REQUEST, "UNTRUSTED_ARTIFACT"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            code: code.to_string(),
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => Self::NotFound(msg),
            StoreError::Validation(e) => Self::Validation(e.to_string()),
            StoreError::InvalidUpload(msg) => Self::Validation(msg),
            StoreError::MalformedKey(msg) => Self::Validation(format!("malformed key: {msg}")),
            e @ StoreError::Untrusted { .. } => Self::Untrusted(e.to_string()),
            e @ (StoreError::DuplicateKey | StoreError::VersionConflict { .. }) => {
                Self::Conflict(e.to_string())
            }
            StoreError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<sigrel_core::ValidationError> for AppError {
    fn from(err: sigrel_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::Validation(format!("malformed multipart body: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (StoreError::InvalidUpload("x".into()), StatusCode::BAD_REQUEST),
            (StoreError::MalformedKey("x".into()), StatusCode::BAD_REQUEST),
            (StoreError::Untrusted { keys_tried: 2 }, StatusCode::BAD_REQUEST),
            (StoreError::DuplicateKey, StatusCode::CONFLICT),
            (
                StoreError::VersionConflict {
                    coordinate: "a/b/c/d".into(),
                    version: "1".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_and_code().0, status);
        }
    }

    #[tokio::test]
    async fn body_has_exactly_two_fields() {
        let (status, json) = body_json(AppError::Conflict("this key is already authorized".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "CONFLICT");
        assert_eq!(json["error"], "this key is already authorized");
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn internal_details_are_hidden() {
        let (status, json) = body_json(AppError::Internal("/srv/data: permission denied".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "An internal error occurred");
    }
}
