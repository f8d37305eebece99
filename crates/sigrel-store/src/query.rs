//! # Query Service
//!
//! Read path for downloaders. Never touches the trust store or the
//! signature engine.

use std::fs::File;

use sigrel_core::{Coordinate, PointerMetadata, Version};

use crate::artifact::ArtifactStore;
use crate::error::StoreError;

/// An opened binary plus the record that resolved it.
#[derive(Debug)]
pub struct BinaryContent {
    /// The pointer that named this file.
    pub metadata: PointerMetadata,
    /// Stored file name (last locator segment).
    pub file_name: String,
    /// Length in bytes.
    pub len: u64,
    /// Open handle positioned at the start.
    pub file: File,
}

/// Read-only view of the artifact store.
#[derive(Debug, Clone)]
pub struct QueryService {
    artifacts: ArtifactStore,
}

impl QueryService {
    /// Wrap an artifact store.
    pub fn new(artifacts: ArtifactStore) -> Self {
        Self { artifacts }
    }

    /// The coordinate's current pointer.
    pub fn current_metadata(&self, coordinate: &Coordinate) -> Result<PointerMetadata, StoreError> {
        self.artifacts.read_pointer(coordinate)
    }

    /// Open the binary for `version`, or the latest when `None`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no pointer exists;
    /// [`StoreError::Io`] when the pointer names a file that is gone.
    pub fn open_binary(
        &self,
        coordinate: &Coordinate,
        version: Option<&Version>,
    ) -> Result<BinaryContent, StoreError> {
        let metadata = self.artifacts.read_selected(coordinate, version)?;
        let file_name = metadata
            .locator_segments()?
            .last()
            .map(|s| s.to_string())
            .unwrap_or_default();
        let (file, len) = self.artifacts.open_content(&metadata)?;
        Ok(BinaryContent {
            metadata,
            file_name,
            len,
            file,
        })
    }
}
