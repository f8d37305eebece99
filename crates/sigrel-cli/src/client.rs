//! # Release Server Client
//!
//! Typed async client for the sigrel HTTP API.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | PUT  | `/api/keys/add` | [`ReleaseClient::add_key`] |
//! | POST | `/api/{c}/{ch}/{os}/{arch}/{v}/uploadbinary` | [`ReleaseClient::upload_binary`] |
//! | GET  | `/api/{c}/{ch}/{os}/{arch}/json` | [`ReleaseClient::latest`] |
//!
//! Non-2xx responses surface the server's `error` field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use sigrel_core::{Coordinate, PointerMetadata, Version};
use sigrel_crypto::TrustedKey;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from sigrel API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server URL is not an absolute http(s) URL.
    #[error("invalid server URL \"{0}\" (expected http:// or https://)")]
    InvalidUrl(String),
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("server rejected {endpoint} ({status}): {message}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// Response deserialization failed.
    #[error("failed to decode response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// A local file could not be opened for upload.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Client bound to one sigrel server.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReleaseClient {
    pub fn new(server: &str) -> Result<Self, ClientError> {
        let base_url = server.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(server.to_string()));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register `key` as a trusted signer.
    pub async fn add_key(&self, password: &str, key: &TrustedKey) -> Result<(), ClientError> {
        let endpoint = "PUT /api/keys/add";
        let resp = self
            .http
            .put(format!("{}/api/keys/add", self.base_url))
            .header("Password", password)
            .header("Key", key.encoded())
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        if !resp.status().is_success() {
            return Err(rejection(endpoint, resp).await);
        }
        Ok(())
    }

    /// Stream `binary` and its detached signature to the upload endpoint.
    pub async fn upload_binary(
        &self,
        coordinate: &Coordinate,
        version: &Version,
        binary: &Path,
        file_name: &str,
        signature: Vec<u8>,
    ) -> Result<(), ClientError> {
        let endpoint = format!("POST /api/{coordinate}/{version}/uploadbinary");
        let io_err = |source| ClientError::Io {
            path: binary.to_path_buf(),
            source,
        };
        let file = tokio::fs::File::open(binary).await.map_err(io_err)?;
        let len = file.metadata().await.map_err(io_err)?.len();

        let form = Form::new()
            .part(
                "file",
                Part::stream_with_length(reqwest::Body::from(file), len)
                    .file_name(file_name.to_string()),
            )
            .part(
                "sign",
                Part::bytes(signature).file_name(format!("{file_name}.sig")),
            );

        let resp = self
            .http
            .post(format!(
                "{}/api/{coordinate}/{version}/uploadbinary",
                self.base_url
            ))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        if !resp.status().is_success() {
            return Err(rejection(&endpoint, resp).await);
        }
        Ok(())
    }

    /// Fetch the coordinate's current pointer metadata.
    pub async fn latest(&self, coordinate: &Coordinate) -> Result<PointerMetadata, ClientError> {
        let endpoint = format!("GET /api/{coordinate}/json");
        let resp = self
            .http
            .get(format!("{}/api/{coordinate}/json", self.base_url))
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        if !resp.status().is_success() {
            return Err(rejection(&endpoint, resp).await);
        }
        resp.json()
            .await
            .map_err(|e| ClientError::Deserialization { endpoint, source: e })
    }
}

async fn rejection(endpoint: &str, resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    ClientError::Rejected {
        endpoint: endpoint.to_string(),
        status,
        message: error_message(&body),
    }
}

/// Pull the `error` field out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_string())
}
