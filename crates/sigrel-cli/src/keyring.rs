//! # Keyring Directory
//!
//! A keyring is a directory holding `private.pem` (SEC1 `EC PRIVATE KEY`)
//! and `public.pem` (SPKI `PUBLIC KEY`). The private key file is created
//! owner-readable only on Unix.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use sigrel_crypto::{KeyPair, TrustedKey};

/// Default keyring directory, relative to the working directory.
pub const DEFAULT_KEYRING: &str = "keyring";

const PRIVATE_FILE: &str = "private.pem";
const PUBLIC_FILE: &str = "public.pem";

/// Handle on a keyring directory.
#[derive(Debug, Clone)]
pub struct Keyring {
    dir: PathBuf,
}

impl Keyring {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn private_path(&self) -> PathBuf {
        self.dir.join(PRIVATE_FILE)
    }

    pub fn public_path(&self) -> PathBuf {
        self.dir.join(PUBLIC_FILE)
    }

    /// Write both halves of `pair`. Refuses to replace an existing private
    /// key unless `overwrite` is set.
    pub fn store(&self, pair: &KeyPair, overwrite: bool) -> Result<TrustedKey> {
        let private_path = self.private_path();
        if private_path.exists() && !overwrite {
            bail!(
                "keyring already holds a private key: {} (use --force to replace it)",
                private_path.display()
            );
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create keyring: {}", self.dir.display()))?;

        let private_pem = pair.to_sec1_pem().context("failed to encode private key")?;
        write_private(&private_path, private_pem.as_bytes())
            .with_context(|| format!("failed to write private key: {}", private_path.display()))?;

        let public = pair.trusted_key().context("failed to derive public key")?;
        let public_path = self.public_path();
        fs::write(&public_path, public.to_pem().context("failed to encode public key")?)
            .with_context(|| format!("failed to write public key: {}", public_path.display()))?;

        tracing::debug!(keyring = %self.dir.display(), "keyring written");
        Ok(public)
    }

    pub fn load_private(&self) -> Result<KeyPair> {
        let path = self.private_path();
        let pem = fs::read_to_string(&path)
            .with_context(|| format!("failed to read private key: {}", path.display()))?;
        KeyPair::from_sec1_pem(&pem)
            .with_context(|| format!("invalid private key: {}", path.display()))
    }

    /// Load the public key, deriving it from the private key when
    /// `public.pem` is absent.
    pub fn load_public(&self) -> Result<TrustedKey> {
        let path = self.public_path();
        if !path.exists() {
            tracing::debug!("public.pem missing; deriving from private key");
            return Ok(self.load_private()?.trusted_key()?);
        }
        read_public_pem(&path)
    }
}

/// Read a PEM `PUBLIC KEY` file.
pub fn read_public_pem(path: &Path) -> Result<TrustedKey> {
    let pem = fs::read_to_string(path)
        .with_context(|| format!("failed to read public key: {}", path.display()))?;
    TrustedKey::from_pem(&pem).with_context(|| format!("invalid public key: {}", path.display()))
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = Keyring::new(dir.path().join("ring"));
        let pair = KeyPair::generate();
        let public = keyring.store(&pair, false).unwrap();

        let loaded = keyring.load_private().unwrap();
        assert_eq!(loaded.trusted_key().unwrap(), public);
        assert_eq!(keyring.load_public().unwrap(), public);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = Keyring::new(dir.path());
        keyring.store(&KeyPair::generate(), false).unwrap();
        assert!(keyring.store(&KeyPair::generate(), false).is_err());
        assert!(keyring.store(&KeyPair::generate(), true).is_ok());
    }

    #[test]
    fn public_key_derived_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = Keyring::new(dir.path());
        let public = keyring.store(&KeyPair::generate(), false).unwrap();
        fs::remove_file(keyring.public_path()).unwrap();
        assert_eq!(keyring.load_public().unwrap(), public);
    }

    #[cfg(unix)]
    #[test]
    fn private_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let keyring = Keyring::new(dir.path());
        keyring.store(&KeyPair::generate(), false).unwrap();
        let mode = fs::metadata(keyring.private_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_keyring_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = Keyring::new(dir.path().join("absent"));
        assert!(keyring.load_private().is_err());
        assert!(keyring.load_public().is_err());
    }
}
