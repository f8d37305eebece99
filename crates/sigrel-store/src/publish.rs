//! # Publish Transaction
//!
//! Turns a staged upload into a committed artifact, or discards it.
//!
//! 1. The caller fills a [`StagingArea`] with the binary and signature.
//! 2. The staged binary is hashed once.
//! 3. Each trusted key is tried in insertion order. A key that fails to
//!    parse is logged and skipped. The first key that verifies wins.
//! 4. With no match the upload is rejected and the content tree is not
//!    touched. With a match the artifact is committed under the
//!    coordinate lock.
//! 5. The staging area is removed in every case.
//!
//! Steps 2-4 do blocking file I/O and run on tokio's blocking pool.

use sigrel_core::{Coordinate, PointerMetadata, Version};
use sigrel_crypto::{digest_file, verify_digest, TrustedKey};

use crate::artifact::{ArtifactStore, StagedArtifact};
use crate::error::StoreError;
use crate::staging::StagingArea;
use crate::trust::TrustStore;

/// Label values for the `sigrel_publish_total` counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Verified and committed.
    Committed,
    /// No trusted key verified the signature.
    Untrusted,
    /// The version already existed.
    Conflict,
    /// Malformed upload.
    Invalid,
    /// Storage or internal failure.
    Failed,
}

impl PublishOutcome {
    fn of(result: &Result<PointerMetadata, StoreError>) -> Self {
        match result {
            Ok(_) => Self::Committed,
            Err(StoreError::Untrusted { .. }) => Self::Untrusted,
            Err(StoreError::VersionConflict { .. }) => Self::Conflict,
            Err(StoreError::InvalidUpload(_) | StoreError::Validation(_)) => Self::Invalid,
            Err(_) => Self::Failed,
        }
    }

    /// Metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::Untrusted => "untrusted",
            Self::Conflict => "conflict",
            Self::Invalid => "invalid",
            Self::Failed => "failed",
        }
    }
}

/// Runs publish transactions against one trust store and artifact store.
#[derive(Debug, Clone)]
pub struct Publisher {
    trust: TrustStore,
    artifacts: ArtifactStore,
}

impl Publisher {
    /// Wire a publisher to its stores.
    pub fn new(trust: TrustStore, artifacts: ArtifactStore) -> Self {
        Self { trust, artifacts }
    }

    /// Verify the staged upload and commit it. Consumes the staging area.
    pub async fn publish(
        &self,
        coordinate: Coordinate,
        version: Version,
        staging: StagingArea,
    ) -> Result<PointerMetadata, StoreError> {
        let this = self.clone();
        let result = tokio::task::spawn_blocking(move || {
            this.publish_blocking(&coordinate, &version, staging)
        })
        .await
        .unwrap_or_else(|e| {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("publish task failed: {e}"),
            )))
        });
        let outcome = PublishOutcome::of(&result);
        metrics::counter!("sigrel_publish_total", "outcome" => outcome.as_str()).increment(1);
        result
    }

    /// Synchronous body of [`Publisher::publish`].
    pub fn publish_blocking(
        &self,
        coordinate: &Coordinate,
        version: &Version,
        staging: StagingArea,
    ) -> Result<PointerMetadata, StoreError> {
        let result = self.verify_and_commit(coordinate, version, &staging);
        staging.close();
        result
    }

    fn verify_and_commit(
        &self,
        coordinate: &Coordinate,
        version: &Version,
        staging: &StagingArea,
    ) -> Result<PointerMetadata, StoreError> {
        let binary = staging.binary_path()?;
        let signature = staging.read_signature()?;
        let file_name = staging
            .file_name()
            .ok_or_else(|| StoreError::InvalidUpload("missing multipart field \"file\"".into()))?;

        let digest = digest_file(&binary)?;
        let keys = self.trust.list_keys()?;

        let Some(index) = first_match(&keys, &digest, &signature) else {
            tracing::warn!(
                coordinate = %coordinate,
                version = %version,
                keys_tried = keys.len(),
                "rejected upload: signature not valid for any trusted key"
            );
            return Err(StoreError::Untrusted {
                keys_tried: keys.len(),
            });
        };
        tracing::debug!(coordinate = %coordinate, key_index = index, "signature verified");

        self.artifacts.commit(
            coordinate,
            version,
            StagedArtifact {
                binary: &binary,
                file_name,
                signature: &signature,
                digest,
            },
        )
    }
}

/// Index of the first key in `keys` that verifies `signature` over `digest`.
fn first_match(keys: &[String], digest: &sigrel_core::ContentDigest, signature: &[u8]) -> Option<usize> {
    keys.iter().enumerate().find_map(|(i, encoded)| {
        let key = match TrustedKey::parse(encoded) {
            Ok(k) => k,
            Err(e) => {
                tracing::warn!(key_index = i, error = %e, "skipping unparseable trusted key");
                return None;
            }
        };
        verify_digest(&key, digest, signature).then_some(i)
    })
}
