//! # Artifact Store
//!
//! Maps a coordinate and version to a directory under `{root}/content/`
//! and maintains the two pointer files (see the crate docs for layout).
//!
//! ## Commit Ordering
//!
//! Under the coordinate's lock: move the staged binary into place, write
//! `signature.der`, write the per-version `version.json`, then swap the
//! coordinate `version.json`. Both pointer files are replaced by rename,
//! so a concurrent reader sees a complete record or the previous one. The
//! four writes are not crash-atomic as a group; a crash before the
//! per-version pointer lands leaves a directory the next commit of that
//! version overwrites.
//!
//! A version whose per-version pointer exists is immutable: committing it
//! again fails with [`StoreError::VersionConflict`].
//!
//! Coordinate locks live in a map only while a commit holds or waits on
//! them; the last committer out removes the entry.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use sigrel_core::{ContentDigest, Coordinate, FileName, ListingEntry, PointerMetadata, Segment, Version};

use crate::error::StoreError;
use crate::fsutil::{move_file, write_atomic};

const POINTER_FILE: &str = "version.json";
const SIGNATURE_FILE: &str = "signature.der";

/// A verified upload ready to be committed.
#[derive(Debug)]
pub struct StagedArtifact<'a> {
    /// Staged binary; moved into the version directory on commit.
    pub binary: &'a Path,
    /// Name the binary is stored under.
    pub file_name: &'a FileName,
    /// DER signature bytes.
    pub signature: &'a [u8],
    /// SHA-256 of the staged binary.
    pub digest: ContentDigest,
}

/// Result of resolving a browse path.
#[derive(Debug)]
pub enum Browse {
    /// The path is a directory.
    Directory(Vec<ListingEntry>),
    /// The path is a regular file.
    File {
        /// Open handle.
        file: File,
        /// Length in bytes.
        len: u64,
    },
}

/// Handle to the versioned content tree.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    content_root: PathBuf,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl ArtifactStore {
    /// Bind to `content_root`. Does not touch the filesystem.
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Root of the content tree.
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    fn coordinate_dir(&self, coordinate: &Coordinate) -> PathBuf {
        coordinate
            .segments()
            .iter()
            .fold(self.content_root.clone(), |p, s| p.join(s))
    }

    fn version_dir(&self, coordinate: &Coordinate, version: &Version) -> PathBuf {
        self.coordinate_dir(coordinate).join(version.as_str())
    }

    fn lock_for(&self, coordinate: &Coordinate) -> Arc<Mutex<()>> {
        self.locks.entry(coordinate.key()).or_default().clone()
    }

    /// Drop the coordinate's lock entry once no other commit holds or waits
    /// on it. `held` is the caller's own handle, so two references (map and
    /// caller) means nobody else is using it.
    fn release_lock(&self, coordinate: &Coordinate, held: &Arc<Mutex<()>>) {
        self.locks.remove_if(&coordinate.key(), |_, entry| {
            Arc::ptr_eq(entry, held) && Arc::strong_count(entry) == 2
        });
    }

    /// Materialize a verified upload and make it the coordinate's latest.
    ///
    /// Blocks while another commit to the same coordinate is in progress.
    pub fn commit(
        &self,
        coordinate: &Coordinate,
        version: &Version,
        staged: StagedArtifact<'_>,
    ) -> Result<PointerMetadata, StoreError> {
        let lock = self.lock_for(coordinate);
        let result = {
            let _guard = lock.lock();
            self.commit_locked(coordinate, version, staged)
        };
        self.release_lock(coordinate, &lock);
        result
    }

    fn commit_locked(
        &self,
        coordinate: &Coordinate,
        version: &Version,
        staged: StagedArtifact<'_>,
    ) -> Result<PointerMetadata, StoreError> {
        let version_dir = self.version_dir(coordinate, version);
        if version_dir.join(POINTER_FILE).exists() {
            return Err(StoreError::VersionConflict {
                coordinate: coordinate.key(),
                version: version.to_string(),
            });
        }
        if version_dir.exists() {
            tracing::warn!(
                coordinate = %coordinate,
                version = %version,
                "replacing incomplete version directory"
            );
            fs::remove_dir_all(&version_dir)?;
        }
        fs::create_dir_all(&version_dir)?;

        move_file(staged.binary, &version_dir.join(staged.file_name.as_str()))?;
        fs::write(version_dir.join(SIGNATURE_FILE), staged.signature)?;

        let metadata = PointerMetadata::new(coordinate, version, staged.file_name, staged.digest);
        let json = metadata
            .to_json()
            .map_err(|e| StoreError::corrupt(POINTER_FILE, e))?;
        write_atomic(&version_dir.join(POINTER_FILE), &json)?;
        write_atomic(&self.coordinate_dir(coordinate).join(POINTER_FILE), &json)?;

        tracing::info!(
            coordinate = %coordinate,
            version = %version,
            checksum = %staged.digest,
            "artifact committed"
        );
        Ok(metadata)
    }

    /// The coordinate's current pointer.
    pub fn read_pointer(&self, coordinate: &Coordinate) -> Result<PointerMetadata, StoreError> {
        read_metadata(&self.coordinate_dir(coordinate).join(POINTER_FILE), || {
            format!("no release published for {coordinate}")
        })
    }

    /// The immutable pointer stored with `version`.
    pub fn read_version_pointer(
        &self,
        coordinate: &Coordinate,
        version: &Version,
    ) -> Result<PointerMetadata, StoreError> {
        read_metadata(&self.version_dir(coordinate, version).join(POINTER_FILE), || {
            format!("version {version} not found for {coordinate}")
        })
    }

    /// Resolve a version selector: `None` means `latest`.
    pub fn read_selected(
        &self,
        coordinate: &Coordinate,
        version: Option<&Version>,
    ) -> Result<PointerMetadata, StoreError> {
        match version {
            None => self.read_pointer(coordinate),
            Some(v) => self.read_version_pointer(coordinate, v),
        }
    }

    /// Map a pointer's locator to a path under the content root.
    pub fn resolve_locator(&self, metadata: &PointerMetadata) -> Result<PathBuf, StoreError> {
        let segments = metadata.locator_segments()?;
        Ok(segments
            .iter()
            .fold(self.content_root.clone(), |p, s| p.join(s)))
    }

    /// Open the binary a pointer names. A missing file is an I/O error.
    pub fn open_content(&self, metadata: &PointerMetadata) -> Result<(File, u64), StoreError> {
        let path = self.resolve_locator(metadata)?;
        let file = File::open(&path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "pointer references missing content");
            e
        })?;
        let len = file.metadata()?.len();
        Ok((file, len))
    }

    /// Resolve a slash-separated path under the content root.
    fn browse_path(&self, suffix: &str) -> Result<PathBuf, StoreError> {
        let mut path = self.content_root.clone();
        for part in suffix.split('/').filter(|p| !p.is_empty()) {
            let segment = Segment::new("path", part)?;
            path.push(segment.as_str());
        }
        Ok(path)
    }

    /// Entries directly below `suffix`, sorted by name. Hidden entries
    /// (temp files mid-rename) are skipped.
    pub fn list_children(&self, suffix: &str) -> Result<Vec<ListingEntry>, StoreError> {
        let path = self.browse_path(suffix)?;
        let not_found = || StoreError::NotFound(format!("no such directory: /{suffix}"));
        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => return Err(not_found()),
            Err(e) if path.is_file() => {
                tracing::debug!(error = %e, "browse target is a file");
                return Err(not_found());
            }
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            out.push(ListingEntry {
                name,
                is_directory: entry.file_type()?.is_dir(),
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// List a directory or open a file, whichever `suffix` names.
    pub fn browse(&self, suffix: &str) -> Result<Browse, StoreError> {
        let path = self.browse_path(suffix)?;
        match fs::metadata(&path) {
            Ok(m) if m.is_file() => Ok(Browse::File {
                file: File::open(&path)?,
                len: m.len(),
            }),
            Ok(_) => Ok(Browse::Directory(self.list_children(suffix)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("no such path: /{suffix}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn read_metadata(
    path: &Path,
    not_found: impl FnOnce() -> String,
) -> Result<PointerMetadata, StoreError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(not_found()))
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes).map_err(|e| StoreError::corrupt(path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigrel_crypto::digest_bytes;

    fn coord() -> Coordinate {
        Coordinate::new("app", "stable", "linux", "x64").unwrap()
    }

    fn commit_bytes(
        store: &ArtifactStore,
        scratch: &Path,
        version: &str,
        content: &[u8],
    ) -> Result<PointerMetadata, StoreError> {
        let binary = scratch.join(format!("staged-{version}"));
        fs::write(&binary, content).unwrap();
        let name = FileName::new("app.bin").unwrap();
        store.commit(
            &coord(),
            &Version::new(version).unwrap(),
            StagedArtifact {
                binary: &binary,
                file_name: &name,
                signature: b"sig",
                digest: digest_bytes(content),
            },
        )
    }

    fn setup() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        let store = ArtifactStore::new(dir.path().join("content"));
        (dir, store)
    }

    #[test]
    fn coordinate_locks_are_released_after_commit() {
        let (dir, store) = setup();
        commit_bytes(&store, dir.path(), "1.0.0", b"a").unwrap();
        assert!(store.locks.is_empty());
        assert!(commit_bytes(&store, dir.path(), "1.0.0", b"b").is_err());
        assert!(store.locks.is_empty());
    }

    #[test]
    fn lock_entry_kept_while_another_commit_holds_it() {
        let (_dir, store) = setup();
        let other = store.lock_for(&coord());
        let mine = store.lock_for(&coord());
        assert!(Arc::ptr_eq(&other, &mine));
        store.release_lock(&coord(), &mine);
        assert_eq!(store.locks.len(), 1);
        drop(other);
        store.release_lock(&coord(), &mine);
        assert!(store.locks.is_empty());
    }

    #[test]
    fn commit_writes_layout() {
        let (dir, store) = setup();
        let meta = commit_bytes(&store, dir.path(), "1.0.0", b"0123456789").unwrap();
        let vdir = dir.path().join("content/app/stable/linux/x64/1.0.0");
        assert_eq!(fs::read(vdir.join("app.bin")).unwrap(), b"0123456789");
        assert_eq!(fs::read(vdir.join("signature.der")).unwrap(), b"sig");
        assert!(vdir.join("version.json").exists());
        assert_eq!(meta.path, "/app/stable/linux/x64/1.0.0/app.bin");
        assert_eq!(store.read_pointer(&coord()).unwrap(), meta);
    }

    #[test]
    fn unknown_coordinate_is_not_found() {
        let (_dir, store) = setup();
        assert!(matches!(
            store.read_pointer(&coord()),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.read_version_pointer(&coord(), &Version::new("9.9.9").unwrap()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn later_commit_moves_pointer_but_keeps_history() {
        let (dir, store) = setup();
        let v1 = commit_bytes(&store, dir.path(), "1.0.0", b"first").unwrap();
        let v2 = commit_bytes(&store, dir.path(), "2.0.0", b"second").unwrap();
        assert_eq!(store.read_pointer(&coord()).unwrap(), v2);
        let old = store
            .read_selected(&coord(), Some(&Version::new("1.0.0").unwrap()))
            .unwrap();
        assert_eq!(old, v1);
        let (mut f, len) = store.open_content(&old).unwrap();
        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut f, &mut buf).unwrap();
        assert_eq!(buf, b"first");
        assert_eq!(len, 5);
    }

    #[test]
    fn recommit_of_version_conflicts() {
        let (dir, store) = setup();
        let first = commit_bytes(&store, dir.path(), "1.0.0", b"original").unwrap();
        assert!(matches!(
            commit_bytes(&store, dir.path(), "1.0.0", b"replacement"),
            Err(StoreError::VersionConflict { .. })
        ));
        assert_eq!(store.read_pointer(&coord()).unwrap(), first);
    }

    #[test]
    fn incomplete_version_dir_is_replaced() {
        let (dir, store) = setup();
        let vdir = dir.path().join("content/app/stable/linux/x64/1.0.0");
        fs::create_dir_all(&vdir).unwrap();
        fs::write(vdir.join("stale.bin"), b"junk").unwrap();
        commit_bytes(&store, dir.path(), "1.0.0", b"fresh").unwrap();
        assert!(!vdir.join("stale.bin").exists());
        assert_eq!(fs::read(vdir.join("app.bin")).unwrap(), b"fresh");
    }

    #[test]
    fn missing_content_is_io_error() {
        let (dir, store) = setup();
        let meta = commit_bytes(&store, dir.path(), "1.0.0", b"data").unwrap();
        fs::remove_file(dir.path().join("content/app/stable/linux/x64/1.0.0/app.bin")).unwrap();
        assert!(matches!(store.open_content(&meta), Err(StoreError::Io(_))));
    }

    #[test]
    fn corrupt_pointer_is_io_error() {
        let (dir, store) = setup();
        let cdir = dir.path().join("content/app/stable/linux/x64");
        fs::create_dir_all(&cdir).unwrap();
        fs::write(cdir.join("version.json"), b"{not json").unwrap();
        assert!(matches!(store.read_pointer(&coord()), Err(StoreError::Io(_))));
    }

    #[test]
    fn escaping_locator_rejected() {
        let (_dir, store) = setup();
        let meta = PointerMetadata {
            version: Version::new("1.0.0").unwrap(),
            checksum: digest_bytes(b""),
            path: "/../../../../../etc/passwd".into(),
        };
        assert!(matches!(
            store.resolve_locator(&meta),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn listing_is_sorted_and_typed() {
        let (dir, store) = setup();
        commit_bytes(&store, dir.path(), "2.0.0", b"b").unwrap();
        commit_bytes(&store, dir.path(), "1.0.0", b"a").unwrap();
        let entries = store.list_children("app/stable/linux/x64").unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["1.0.0", "2.0.0", "version.json"]);
        assert!(entries[0].is_directory);
        assert!(!entries[2].is_directory);
        assert_eq!(store.list_children("").unwrap()[0].name, "app");
    }

    #[test]
    fn listing_rejects_traversal_and_unknown() {
        let (_dir, store) = setup();
        assert!(matches!(
            store.list_children("app/../.."),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.list_children("nothing/here"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn browse_distinguishes_files() {
        let (dir, store) = setup();
        commit_bytes(&store, dir.path(), "1.0.0", b"bytes").unwrap();
        match store.browse("app/stable/linux/x64/1.0.0/app.bin").unwrap() {
            Browse::File { len, .. } => assert_eq!(len, 5),
            Browse::Directory(_) => panic!("expected file"),
        }
        assert!(matches!(
            store.browse("app/stable").unwrap(),
            Browse::Directory(_)
        ));
    }

    #[test]
    fn concurrent_commits_leave_one_whole_pointer() {
        let (dir, store) = setup();
        let versions: Vec<String> = (0..16).map(|i| format!("1.0.{i}")).collect();
        std::thread::scope(|s| {
            for v in &versions {
                let store = store.clone();
                let scratch = dir.path().to_path_buf();
                s.spawn(move || commit_bytes(&store, &scratch, v, v.as_bytes()).unwrap());
            }
        });
        let latest = store.read_pointer(&coord()).unwrap();
        let own = store
            .read_version_pointer(&coord(), &latest.version)
            .unwrap();
        assert_eq!(latest, own);
        assert_eq!(latest.checksum, digest_bytes(latest.version.as_str().as_bytes()));
    }
}
