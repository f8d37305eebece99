//! # sigrel-api — Binary Entry Point
//!
//! Reads configuration from `SIGREL_*` environment variables, opens the
//! working directory, and serves the HTTP API until Ctrl-C / SIGTERM.

use metrics_exporter_prometheus::PrometheusBuilder;
use sigrel_api::{AppConfig, AppState};
use sigrel_store::Workspace;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(?config, "starting sigrel-api");

    if config.password.is_none() {
        tracing::warn!("SIGREL_PASSWORD is not set: key registration is disabled");
    }

    let workspace = Workspace::open(&config.workdir).map_err(|e| {
        tracing::error!("failed to open working directory: {e}");
        e
    })?;

    let mut state = AppState::new(config.clone(), workspace);
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => tracing::warn!("metrics recorder not installed: {e}"),
    }

    let app = sigrel_api::app(state);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("sigrel-api listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
