//! # Workspace Handle
//!
//! Built once at startup from the working directory and passed to every
//! component that needs storage.

use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::ArtifactStore;
use crate::error::StoreError;
use crate::publish::Publisher;
use crate::query::QueryService;
use crate::staging::StagingArea;
use crate::trust::TrustStore;

/// Trust store file name inside the working directory.
pub const KEYSTORE_FILE: &str = "keystore.json";

/// All storage rooted at one working directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    trust: TrustStore,
    artifacts: ArtifactStore,
}

impl Workspace {
    /// Create the directory skeleton if needed and initialize the trust store.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join("content"))?;
        fs::create_dir_all(root.join("staging"))?;
        let trust = TrustStore::new(root.join(KEYSTORE_FILE));
        trust.initialize()?;
        let artifacts = ArtifactStore::new(root.join("content"));
        tracing::info!(root = %root.display(), "workspace opened");
        Ok(Self {
            root,
            trust,
            artifacts,
        })
    }

    /// The working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding in-flight uploads.
    pub fn staging_root(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Allocate a staging area for a new upload.
    pub fn stage(&self) -> Result<StagingArea, StoreError> {
        StagingArea::create(&self.staging_root())
    }

    /// The trust store.
    pub fn trust(&self) -> &TrustStore {
        &self.trust
    }

    /// The artifact store.
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// A publisher over this workspace's stores.
    pub fn publisher(&self) -> Publisher {
        Publisher::new(self.trust.clone(), self.artifacts.clone())
    }

    /// A query service over this workspace's artifact store.
    pub fn query(&self) -> QueryService {
        QueryService::new(self.artifacts.clone())
    }
}
