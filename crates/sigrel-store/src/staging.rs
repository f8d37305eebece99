//! # Staging Areas
//!
//! Every upload lands in its own directory under `{root}/staging/` before
//! anything is verified. Names are `upload-<uuid v4>-<random suffix>`, so
//! concurrent uploads to the same coordinate never share a directory.
//!
//! The directory is removed when the [`StagingArea`] is dropped, whatever
//! the outcome. [`StagingArea::close`] does the same but logs a removal
//! failure instead of ignoring it.

use std::path::{Path, PathBuf};

use sigrel_core::FileName;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::StoreError;

/// Upper bound for the detached signature part. A DER P-256 signature is
/// at most 72 bytes.
pub const MAX_SIGNATURE_BYTES: u64 = 4 * 1024;

const BINARY_FILE: &str = "payload";
const SIGNATURE_FILE: &str = "signature";

/// Scratch directory holding one unverified upload.
#[derive(Debug)]
pub struct StagingArea {
    dir: Option<TempDir>,
    path: PathBuf,
    file_name: Option<FileName>,
    has_signature: bool,
}

impl StagingArea {
    /// Allocate a fresh, uniquely named directory under `staging_root`.
    pub fn create(staging_root: &Path) -> Result<Self, StoreError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("upload-{}-", Uuid::new_v4()))
            .tempdir_in(staging_root)?;
        let path = dir.path().to_path_buf();
        tracing::debug!(path = %path.display(), "staging area allocated");
        Ok(Self {
            dir: Some(dir),
            path,
            file_name: None,
            has_signature: false,
        })
    }

    /// Directory backing this staging area.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start writing the binary part. A second call replaces the first.
    pub async fn binary_writer(&mut self, file_name: FileName) -> Result<StagedWriter, StoreError> {
        self.file_name = Some(file_name);
        StagedWriter::create(self.path.join(BINARY_FILE), "file", None).await
    }

    /// Start writing the signature part, capped at [`MAX_SIGNATURE_BYTES`].
    pub async fn signature_writer(&mut self) -> Result<StagedWriter, StoreError> {
        self.has_signature = true;
        StagedWriter::create(
            self.path.join(SIGNATURE_FILE),
            "sign",
            Some(MAX_SIGNATURE_BYTES),
        )
        .await
    }

    /// Stored name of the staged binary, once the binary part was seen.
    pub fn file_name(&self) -> Option<&FileName> {
        self.file_name.as_ref()
    }

    /// Path of the staged binary.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidUpload`] when no `file` part was staged.
    pub fn binary_path(&self) -> Result<PathBuf, StoreError> {
        if self.file_name.is_none() {
            return Err(StoreError::InvalidUpload("missing multipart field \"file\"".into()));
        }
        Ok(self.path.join(BINARY_FILE))
    }

    /// Read back the staged signature.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidUpload`] when no `sign` part was staged.
    pub fn read_signature(&self) -> Result<Vec<u8>, StoreError> {
        if !self.has_signature {
            return Err(StoreError::InvalidUpload("missing multipart field \"sign\"".into()));
        }
        Ok(std::fs::read(self.path.join(SIGNATURE_FILE))?)
    }

    /// Remove the directory now, logging rather than ignoring failures.
    pub fn close(mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove staging area");
            }
        }
    }
}

/// Streaming sink for one multipart part.
#[derive(Debug)]
pub struct StagedWriter {
    file: tokio::fs::File,
    written: u64,
    limit: Option<u64>,
    part: &'static str,
}

impl StagedWriter {
    async fn create(path: PathBuf, part: &'static str, limit: Option<u64>) -> Result<Self, StoreError> {
        let file = tokio::fs::File::create(&path).await?;
        Ok(Self {
            file,
            written: 0,
            limit,
            part,
        })
    }

    /// Append one chunk.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StoreError> {
        self.written += chunk.len() as u64;
        if let Some(limit) = self.limit {
            if self.written > limit {
                return Err(StoreError::InvalidUpload(format!(
                    "field \"{}\" exceeds {limit} bytes",
                    self.part
                )));
            }
        }
        self.file.write_all(chunk).await?;
        Ok(())
    }

    /// Flush to disk and return the number of bytes written.
    pub async fn finish(mut self) -> Result<u64, StoreError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(self.written)
    }
}
