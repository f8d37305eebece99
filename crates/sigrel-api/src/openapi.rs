//! # OpenAPI Document Assembly
//!
//! Collects the utoipa-documented routes into one document served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the release server.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "sigrel: Signed Release Server",
        version = "0.1.0",
        description = "Publish signed binaries, register trusted P-256 keys, and serve the latest verified release per component, channel, OS and architecture."
    ),
    paths(
        crate::routes::releases::current_metadata,
        crate::routes::releases::get_binary,
        crate::routes::releases::upload_binary,
        crate::routes::keys::add_key,
        crate::routes::files::browse_root,
        crate::routes::files::browse_path,
    ),
    components(schemas(crate::error::ErrorBody)),
    tags(
        (name = "releases", description = "Pointer metadata, downloads and uploads"),
        (name = "keys", description = "Trusted key registration"),
        (name = "files", description = "Content tree browsing"),
    )
)]
pub struct ApiDoc;

/// Router serving `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_release_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc
            .paths
            .paths
            .contains_key("/api/{component}/{channel}/{os}/{arch}/{version}/uploadbinary"));
        assert!(doc.paths.paths.contains_key("/api/keys/add"));
    }
}
