//! # sigrel-api — HTTP Surface of the Signed Release Server
//!
//! ## API Surface
//!
//! | Path | Module | Purpose |
//! |------|--------|---------|
//! | `/api/{component}/{channel}/{os}/{arch}/json` | [`routes::releases`] | current pointer |
//! | `/api/{component}/{channel}/{os}/{arch}/{version}/getbinary` | [`routes::releases`] | download |
//! | `/api/{component}/{channel}/{os}/{arch}/{version}/uploadbinary` | [`routes::releases`] | signed upload |
//! | `/api/keys/add` | [`routes::keys`] | register a trusted key |
//! | `/`, `/files/*` | [`routes::files`] | browse the content tree |
//! | `/health/*` | this module | probes |
//! | `/metrics` | [`middleware::metrics`] | Prometheus exposition |
//! | `/openapi.json` | [`openapi`] | OpenAPI document |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! Handlers validate path input into domain types and delegate to
//! `sigrel-store`; all errors map to `{"code", "error"}` via [`AppError`].

pub mod auth;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    let api = Router::new()
        .merge(routes::releases::router(max_upload_bytes))
        .merge(routes::keys::router())
        .merge(routes::files::router())
        .merge(openapi::router())
        .route("/metrics", get(middleware::metrics::render))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .fallback(page_not_found)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http());

    api.with_state(state)
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the trust store is readable.
async fn readiness(State(state): State<AppState>) -> Response {
    let trust = state.workspace.trust().clone();
    match routes::blocking(move || trust.list_keys()).await {
        Ok(_) => "ready".into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
        }
    }
}

async fn page_not_found() -> Response {
    let body = error::ErrorBody {
        code: "PAGE_NOT_FOUND".to_string(),
        error: "404 page not found".to_string(),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
