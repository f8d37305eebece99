//! # Detached Signatures
//!
//! ECDSA over the SHA-256 digest of the content. The digest is used as the
//! prehash directly, so a signature here verifies against the same key and
//! digest under any standard ECDSA P-256 implementation.

use std::io::Read;

use p256::ecdsa::signature::hazmat::{PrehashVerifier, RandomizedPrehashSigner};
use p256::ecdsa::Signature;
use rand_core::OsRng;
use sigrel_core::ContentDigest;

use crate::digest::digest_reader;
use crate::error::CryptoError;
use crate::keys::{KeyPair, TrustedKey};

/// Sign an already computed digest. Returns the DER encoded signature.
pub fn sign_digest(key: &KeyPair, digest: &ContentDigest) -> Result<Vec<u8>, CryptoError> {
    let signature: Signature = key
        .signing_key()
        .sign_prehash_with_rng(&mut OsRng, digest.as_bytes())
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    Ok(signature.to_der().as_bytes().to_vec())
}

/// Hash `content` and sign the digest.
pub fn sign<R: Read>(key: &KeyPair, content: R) -> Result<Vec<u8>, CryptoError> {
    let digest = digest_reader(content)?;
    sign_digest(key, &digest)
}

/// Check a DER signature against an already computed digest.
///
/// Malformed DER is an ordinary verification failure.
pub fn verify_digest(key: &TrustedKey, digest: &ContentDigest, signature_der: &[u8]) -> bool {
    let Ok(signature) = Signature::from_der(signature_der) else {
        return false;
    };
    key.verifying_key()
        .verify_prehash(digest.as_bytes(), &signature)
        .is_ok()
}

/// Hash `content` and check `signature_der` against it.
///
/// # Errors
///
/// Only I/O failures while reading `content` are errors.
pub fn verify<R: Read>(
    key: &TrustedKey,
    content: R,
    signature_der: &[u8],
) -> Result<bool, CryptoError> {
    let digest = digest_reader(content)?;
    Ok(verify_digest(key, &digest, signature_der))
}
