//! # Prometheus Metrics
//!
//! Request counters and latency histograms through the `metrics` facade.
//! When `main` installs the Prometheus recorder, `/metrics` renders them
//! together with the publish outcome counters from `sigrel-store`.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::AppState;

/// Record `sigrel_http_requests_total` and `sigrel_http_request_duration_seconds`.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        "sigrel_http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "sigrel_http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(started.elapsed().as_secs_f64());

    response
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn render(State(state): State<AppState>) -> Result<Response, AppError> {
    match &state.metrics {
        Some(handle) => Ok(handle.render().into_response()),
        None => Err(AppError::NotFound("metrics recorder not installed".into())),
    }
}
