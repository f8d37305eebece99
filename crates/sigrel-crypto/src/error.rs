//! # Cryptographic Error Types
//!
//! Structured errors for key handling and signing in `sigrel-crypto`.
//! Verification never produces a [`CryptoError`] for bad signatures; it
//! returns `false` instead.

use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The input was not valid standard-alphabet base64.
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    /// The input did not decode to a P-256 public key.
    #[error("invalid P-256 public key: {0}")]
    InvalidPublicKey(String),

    /// The input did not decode to a P-256 private key.
    #[error("invalid P-256 private key: {0}")]
    InvalidPrivateKey(String),

    /// Key material could not be encoded.
    #[error("key encoding failed: {0}")]
    Encoding(String),

    /// The signer rejected the digest.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Content could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_public_key_display() {
        let err = CryptoError::InvalidPublicKey("wrong curve".to_string());
        assert!(format!("{err}").contains("wrong curve"));
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = CryptoError::from(io_err);
        assert!(matches!(err, CryptoError::Io(_)));
        assert!(format!("{err}").contains("file missing"));
    }
}
