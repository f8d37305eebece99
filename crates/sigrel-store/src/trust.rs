//! # Trust Store
//!
//! The registry of public keys authorized to sign artifacts, persisted as
//! `{"authorized_keys": [...]}`. The file is re-read on every call so an
//! operator edit takes effect without a restart; the key set is small.
//!
//! Mutations hold an in-process mutex across read-modify-write, and the
//! file is replaced by rename, so concurrent registrations never lose each
//! other's entries and readers never see a torn file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sigrel_crypto::TrustedKey;

use crate::error::StoreError;
use crate::fsutil::write_atomic;

#[derive(Debug, Default, Serialize, Deserialize)]
struct KeyFile {
    authorized_keys: Vec<String>,
}

/// Handle to the on-disk trust store.
#[derive(Debug, Clone)]
pub struct TrustStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl TrustStore {
    /// Bind to the key file at `path`. Does not touch the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Location of the key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty key file if none exists. Idempotent.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        if self.path.exists() {
            return Ok(());
        }
        self.save(&KeyFile::default())?;
        tracing::info!(path = %self.path.display(), "initialized empty trust store");
        Ok(())
    }

    /// Register `candidate` (base64 SPKI DER).
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] when the exact string is already
    /// present, [`StoreError::MalformedKey`] when it does not parse. In
    /// both cases the file is left untouched.
    pub fn add_key(&self, candidate: &str) -> Result<TrustedKey, StoreError> {
        let _guard = self.write_lock.lock();
        let mut file = self.load()?;
        if file.authorized_keys.iter().any(|k| k == candidate) {
            return Err(StoreError::DuplicateKey);
        }
        let key =
            TrustedKey::parse(candidate).map_err(|e| StoreError::MalformedKey(e.to_string()))?;
        file.authorized_keys.push(candidate.to_string());
        self.save(&file)?;
        tracing::info!(key = ?key, total = file.authorized_keys.len(), "trusted key added");
        Ok(key)
    }

    /// All registered keys, in insertion order.
    pub fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.authorized_keys)
    }

    /// Whether `candidate` is registered verbatim.
    pub fn contains(&self, candidate: &str) -> Result<bool, StoreError> {
        Ok(self.load()?.authorized_keys.iter().any(|k| k == candidate))
    }

    fn load(&self) -> Result<KeyFile, StoreError> {
        let bytes = fs::read(&self.path)?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::corrupt(self.path.display(), e))
    }

    fn save(&self, file: &KeyFile) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec(file).map_err(|e| StoreError::corrupt(self.path.display(), e))?;
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigrel_crypto::KeyPair;

    fn store() -> (tempfile::TempDir, TrustStore) {
        let dir = tempfile::tempdir().unwrap();
        let ts = TrustStore::new(dir.path().join("keystore.json"));
        ts.initialize().unwrap();
        (dir, ts)
    }

    fn public_key() -> String {
        KeyPair::generate().trusted_key().unwrap().encoded().to_string()
    }

    #[test]
    fn initialize_writes_empty_list() {
        let (_dir, ts) = store();
        let raw = fs::read_to_string(ts.path()).unwrap();
        assert_eq!(raw, r#"{"authorized_keys":[]}"#);
        assert!(ts.list_keys().unwrap().is_empty());
    }

    #[test]
    fn initialize_is_idempotent() {
        let (_dir, ts) = store();
        let k = public_key();
        ts.add_key(&k).unwrap();
        ts.initialize().unwrap();
        assert_eq!(ts.list_keys().unwrap(), vec![k]);
    }

    #[test]
    fn duplicate_key_rejected_and_listed_once() {
        let (_dir, ts) = store();
        let k = public_key();
        ts.add_key(&k).unwrap();
        assert!(matches!(ts.add_key(&k), Err(StoreError::DuplicateKey)));
        assert_eq!(ts.list_keys().unwrap(), vec![k.clone()]);
        assert!(ts.contains(&k).unwrap());
    }

    #[test]
    fn malformed_key_never_persisted() {
        let (_dir, ts) = store();
        assert!(matches!(
            ts.add_key("bm90IGEga2V5"),
            Err(StoreError::MalformedKey(_))
        ));
        assert!(ts.list_keys().unwrap().is_empty());
    }

    #[test]
    fn insertion_order_preserved() {
        let (_dir, ts) = store();
        let keys: Vec<String> = (0..4).map(|_| public_key()).collect();
        for k in &keys {
            ts.add_key(k).unwrap();
        }
        assert_eq!(ts.list_keys().unwrap(), keys);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let ts = TrustStore::new(dir.path().join("absent.json"));
        assert!(matches!(ts.list_keys(), Err(StoreError::Io(_))));
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let (_dir, ts) = store();
        let keys: Vec<String> = (0..8).map(|_| public_key()).collect();
        std::thread::scope(|s| {
            for k in &keys {
                let ts = ts.clone();
                s.spawn(move || ts.add_key(k).unwrap());
            }
        });
        let mut listed = ts.list_keys().unwrap();
        let mut expected = keys.clone();
        listed.sort();
        expected.sort();
        assert_eq!(listed, expected);
    }
}
