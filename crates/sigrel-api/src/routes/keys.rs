//! # Key Registration
//!
//! `PUT /api/keys/add` with headers `Password` (shared secret) and `Key`
//! (base64 SubjectPublicKeyInfo DER of a P-256 public key).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::put;
use axum::Router;

use super::blocking;
use crate::auth::check_password;
use crate::error::AppError;
use crate::state::AppState;

/// Build the key router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/keys/add", put(add_key))
}

/// Register a trusted public key.
#[utoipa::path(
    put,
    path = "/api/keys/add",
    params(
        ("Password" = String, Header, description = "Shared secret"),
        ("Key" = String, Header, description = "Base64 DER SubjectPublicKeyInfo (P-256)"),
    ),
    responses(
        (status = 201, description = "Key registered"),
        (status = 400, description = "Missing or malformed key", body = crate::error::ErrorBody),
        (status = 401, description = "Wrong password or registration disabled", body = crate::error::ErrorBody),
        (status = 409, description = "Key already registered", body = crate::error::ErrorBody),
    ),
    tag = "keys"
)]
async fn add_key(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, AppError> {
    check_password(state.config.password.as_ref(), &headers)?;
    let key = headers
        .get("key")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::Validation("missing Key header".into()))?
        .to_string();

    let trust = state.workspace.trust().clone();
    blocking(move || trust.add_key(&key)).await?;
    Ok(StatusCode::CREATED)
}
