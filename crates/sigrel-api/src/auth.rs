//! # Key Registration Auth
//!
//! `PUT /api/keys/add` carries the shared secret in a `Password` header.
//! It is compared in constant time. With no secret configured every call
//! is rejected.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Shared secret held by the server. `Debug` is redacted.
#[derive(Clone)]
pub struct SecretPassword(String);

impl SecretPassword {
    /// Wrap a secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretPassword([REDACTED])")
    }
}

/// Constant-time string comparison.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Check the `Password` header against the configured secret.
pub fn check_password(expected: Option<&SecretPassword>, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = expected else {
        tracing::warn!("key registration attempted but no password is configured");
        return Err(AppError::Unauthorized("key registration is disabled".into()));
    };
    let provided = headers
        .get("password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if constant_time_token_eq(provided, expected.expose()) {
        Ok(())
    } else {
        tracing::warn!("key registration rejected: wrong password");
        Err(AppError::Unauthorized("wrong password".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(password: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(p) = password {
            h.insert("Password", HeaderValue::from_str(p).unwrap());
        }
        h
    }

    #[test]
    fn constant_time_eq_identical() {
        assert!(constant_time_token_eq("secret-123", "secret-123"));
    }

    #[test]
    fn constant_time_eq_rejects_prefix_and_empty() {
        assert!(!constant_time_token_eq("secret", "secret-123"));
        assert!(!constant_time_token_eq("", "secret-123"));
    }

    #[test]
    fn password_accepted() {
        let secret = SecretPassword::new("pw");
        assert!(check_password(Some(&secret), &headers(Some("pw"))).is_ok());
    }

    #[test]
    fn password_rejected() {
        let secret = SecretPassword::new("pw");
        assert!(matches!(
            check_password(Some(&secret), &headers(Some("nope"))),
            Err(AppError::Unauthorized(_))
        ));
        assert!(check_password(Some(&secret), &headers(None)).is_err());
    }

    #[test]
    fn disabled_without_secret() {
        assert!(matches!(
            check_password(None, &headers(Some(""))),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn debug_is_redacted() {
        assert_eq!(format!("{:?}", SecretPassword::new("pw")), "SecretPassword([REDACTED])");
    }
}
