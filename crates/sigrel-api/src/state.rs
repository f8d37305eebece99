//! # Application State
//!
//! [`AppConfig`] is read once from the environment in `main`.
//! [`AppState`] bundles it with the storage [`Workspace`] and the optional
//! Prometheus handle, and is passed to every handler via `State`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sigrel_store::Workspace;
use thiserror::Error;

use crate::auth::SecretPassword;

/// Default request body limit for uploads: 1 GiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Invalid environment configuration.
#[derive(Error, Debug)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    /// Variable name.
    pub var: &'static str,
    /// Offending value.
    pub value: String,
    /// Parse failure.
    pub reason: String,
}

/// Server configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Listen address (`SIGREL_BIND`).
    pub bind: SocketAddr,
    /// Working directory (`SIGREL_WORKDIR`).
    pub workdir: PathBuf,
    /// Shared secret for key registration (`SIGREL_PASSWORD`). `None`
    /// disables registration.
    pub password: Option<SecretPassword>,
    /// Upload body limit in bytes (`SIGREL_MAX_UPLOAD_BYTES`).
    pub max_upload_bytes: usize,
    /// Emit JSON logs (`SIGREL_LOG_FORMAT=json`).
    pub log_json: bool,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = lookup("SIGREL_BIND") {
            config.bind = v.parse().map_err(|e: std::net::AddrParseError| ConfigError {
                var: "SIGREL_BIND",
                value: v.clone(),
                reason: e.to_string(),
            })?;
        }
        if let Some(v) = lookup("SIGREL_WORKDIR") {
            config.workdir = PathBuf::from(v);
        }
        config.password = lookup("SIGREL_PASSWORD")
            .filter(|p| !p.is_empty())
            .map(SecretPassword::new);
        if let Some(v) = lookup("SIGREL_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes =
                v.parse().map_err(|e: std::num::ParseIntError| ConfigError {
                    var: "SIGREL_MAX_UPLOAD_BYTES",
                    value: v.clone(),
                    reason: e.to_string(),
                })?;
        }
        config.log_json = lookup("SIGREL_LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            workdir: PathBuf::from("./sigrel-data"),
            password: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_json: false,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind", &self.bind)
            .field("workdir", &self.workdir)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("log_json", &self.log_json)
            .finish()
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<AppConfig>,
    /// Storage rooted at the working directory.
    pub workspace: Workspace,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state from configuration and an opened workspace.
    pub fn new(config: AppConfig, workspace: Workspace) -> Self {
        Self {
            config: Arc::new(config),
            workspace,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("workspace", &self.workspace)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let c = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c.bind.port(), 8080);
        assert_eq!(c.workdir, PathBuf::from("./sigrel-data"));
        assert!(c.password.is_none());
        assert_eq!(c.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(!c.log_json);
    }

    #[test]
    fn overrides() {
        let c = AppConfig::from_lookup(lookup(&[
            ("SIGREL_BIND", "127.0.0.1:9000"),
            ("SIGREL_WORKDIR", "/srv/sigrel"),
            ("SIGREL_PASSWORD", "hunter2"),
            ("SIGREL_MAX_UPLOAD_BYTES", "1048576"),
            ("SIGREL_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(c.bind.to_string(), "127.0.0.1:9000");
        assert_eq!(c.workdir, PathBuf::from("/srv/sigrel"));
        assert!(c.password.is_some());
        assert_eq!(c.max_upload_bytes, 1_048_576);
        assert!(c.log_json);
    }

    #[test]
    fn empty_password_disables_registration() {
        let c = AppConfig::from_lookup(lookup(&[("SIGREL_PASSWORD", "")])).unwrap();
        assert!(c.password.is_none());
    }

    #[test]
    fn bad_values_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("SIGREL_BIND", "nope")])).unwrap_err();
        assert_eq!(err.var, "SIGREL_BIND");
        assert!(AppConfig::from_lookup(lookup(&[("SIGREL_MAX_UPLOAD_BYTES", "-1")])).is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let c = AppConfig::from_lookup(lookup(&[("SIGREL_PASSWORD", "hunter2")])).unwrap();
        let debug = format!("{c:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
