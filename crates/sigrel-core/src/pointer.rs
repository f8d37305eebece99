//! # Pointer Metadata
//!
//! [`PointerMetadata`] is the `{version, checksum, path}` record stored as
//! `version.json`, once per version (immutable) and once per coordinate
//! (overwritten on every successful publish). It is also the JSON body of
//! `GET .../json`.
//!
//! The `path` locator names the binary relative to the content root:
//! `/{component}/{channel}/{os}/{arch}/{version}/{file}`.

use serde::{Deserialize, Serialize};

use crate::coordinate::{Coordinate, FileName, Version};
use crate::digest::ContentDigest;
use crate::error::ValidationError;

/// Describes one committed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerMetadata {
    /// The published version.
    pub version: Version,
    /// SHA-256 of the binary content.
    pub checksum: ContentDigest,
    /// Content-root-relative locator of the binary. Older records named
    /// this field `url`.
    #[serde(alias = "url")]
    pub path: String,
}

impl PointerMetadata {
    /// Build the record for a binary stored under `coordinate`/`version`.
    pub fn new(
        coordinate: &Coordinate,
        version: &Version,
        file: &FileName,
        checksum: ContentDigest,
    ) -> Self {
        let [component, channel, os, arch] = coordinate.segments();
        Self {
            version: version.clone(),
            checksum,
            path: format!("/{component}/{channel}/{os}/{arch}/{version}/{file}"),
        }
    }

    /// Split the locator into validated path segments.
    ///
    /// Every segment passes the same rules as a coordinate segment, so the
    /// result can be joined onto the content root without escaping it.
    pub fn locator_segments(&self) -> Result<Vec<&str>, ValidationError> {
        let trimmed = self.path.strip_prefix('/').unwrap_or(&self.path);
        let parts: Vec<&str> = trimmed.split('/').collect();
        if parts.len() != 6 {
            return Err(ValidationError::InvalidLocator(self.path.clone()));
        }
        for part in &parts {
            crate::coordinate::Segment::new("locator", *part)
                .map_err(|_| ValidationError::InvalidLocator(self.path.clone()))?;
        }
        Ok(parts)
    }

    /// Serialize to the on-disk / wire JSON form.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// One entry of a content directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Entry name within its parent directory.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
}
