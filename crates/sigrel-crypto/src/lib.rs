//! # sigrel-crypto — Digest & Signature Engine
//!
//! - **SHA-256** content digests over files, readers and byte slices,
//!   producing [`ContentDigest`](sigrel_core::ContentDigest) values.
//! - **P-256 ECDSA** key pairs ([`KeyPair`]) and trusted public keys
//!   ([`TrustedKey`]) in the encodings the release server exchanges:
//!   base64 SubjectPublicKeyInfo DER for public keys, SEC1 DER/PEM for
//!   private keys.
//! - **Detached signatures** over a content digest, DER encoded as an
//!   ASN.1 `SEQUENCE { r INTEGER, s INTEGER }`.
//!
//! Signing draws a fresh nonce from the OS RNG on every call, so two
//! signatures over the same content are not byte-identical. Verification
//! answers `false` for every cryptographically invalid input; only I/O
//! failures while reading content surface as errors.

pub mod digest;
pub mod error;
pub mod keys;
pub mod signature;

pub use digest::{digest_bytes, digest_file, digest_reader};
pub use error::CryptoError;
pub use keys::{KeyPair, TrustedKey};
pub use signature::{sign, sign_digest, verify, verify_digest};
