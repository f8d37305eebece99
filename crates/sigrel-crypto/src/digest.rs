//! # SHA-256 Digest Computation
//!
//! Streaming digests over readers and files. Content is hashed exactly as
//! stored, with no canonicalization.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use sigrel_core::ContentDigest;

const CHUNK_SIZE: usize = 64 * 1024;

/// Hash everything `reader` yields until EOF.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(ContentDigest::from_bytes(hasher.finalize().into()))
}

/// Hash the file at `path`.
pub fn digest_file(path: &Path) -> io::Result<ContentDigest> {
    digest_reader(File::open(path)?)
}

/// Hash an in-memory buffer.
pub fn digest_bytes(data: &[u8]) -> ContentDigest {
    ContentDigest::from_bytes(Sha256::digest(data).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn known_vectors() {
        assert_eq!(
            digest_bytes(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            digest_bytes(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn reader_matches_bytes_across_chunk_boundary() {
        let data: Vec<u8> = (0..CHUNK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
        let streamed = digest_reader(data.as_slice()).unwrap();
        assert_eq!(streamed, digest_bytes(&data));
    }

    #[test]
    fn file_digest() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"0123456789").unwrap();
        f.flush().unwrap();
        assert_eq!(digest_file(f.path()).unwrap(), digest_bytes(b"0123456789"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = digest_file(&dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
