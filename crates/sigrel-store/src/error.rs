//! # Store Error Types
//!
//! One enum for every failure the trust store, artifact store and publish
//! pipeline can report. The HTTP layer maps each variant to a status code.

use sigrel_core::ValidationError;
use thiserror::Error;

/// Errors from the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Nothing has been published at the requested coordinate or version.
    #[error("not found: {0}")]
    NotFound(String),

    /// A path segment, version or file name failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The upload itself was unusable (missing part, oversized signature).
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// No trusted key verified the signature.
    #[error("signature not valid for any of {keys_tried} trusted key(s)")]
    Untrusted {
        /// Number of keys in the trust store when verification ran.
        keys_tried: usize,
    },

    /// The key is already in the trust store.
    #[error("this key is already authorized")]
    DuplicateKey,

    /// The key did not parse as a P-256 public key.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// The version was already published for this coordinate.
    #[error("version {version} already exists for {coordinate}")]
    VersionConflict {
        /// Slash-joined coordinate key.
        coordinate: String,
        /// The rejected version.
        version: String,
    },

    /// Storage read/write failure, including unreadable metadata.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Wrap an unparseable metadata file as an I/O failure.
    pub(crate) fn corrupt(what: impl std::fmt::Display, err: serde_json::Error) -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{what}: {err}"),
        ))
    }
}
