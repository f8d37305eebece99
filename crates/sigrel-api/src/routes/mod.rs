//! # Route Modules
//!
//! - [`releases`]: pointer metadata, downloads and uploads under `/api/{coordinate}`.
//! - [`keys`]: trusted key registration.
//! - [`files`]: read-only browsing of the content tree.

pub mod files;
pub mod keys;
pub mod releases;

use sigrel_store::StoreError;

use crate::error::AppError;

/// Run blocking storage work off the async executor.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))?
        .map_err(AppError::from)
}
