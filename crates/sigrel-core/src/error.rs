//! # Validation Errors
//!
//! Structured errors raised when request input fails the path-safety and
//! format rules enforced by the domain newtypes. Built with `thiserror`;
//! every variant carries the rejected input so operators can see exactly
//! what a client sent.

use thiserror::Error;

/// Validation errors for domain newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A coordinate segment or version was empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Which field was empty (e.g. "component", "version").
        field: &'static str,
    },

    /// A segment exceeded the maximum length.
    #[error("{field} too long: {len} bytes (max {max})")]
    TooLong {
        /// Which field was too long.
        field: &'static str,
        /// Actual length in bytes.
        len: usize,
        /// Maximum permitted length in bytes.
        max: usize,
    },

    /// A segment contained a character outside the permitted alphabet.
    #[error("{field} contains invalid character {ch:?} in \"{value}\" (allowed: A-Z a-z 0-9 . _ - +)")]
    InvalidCharacter {
        /// Which field was invalid.
        field: &'static str,
        /// The rejected input.
        value: String,
        /// The first offending character.
        ch: char,
    },

    /// A segment would be interpreted as a relative or hidden path.
    #[error("{field} \"{value}\" is not a safe path segment")]
    UnsafeSegment {
        /// Which field was invalid.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// The name is reserved by the storage layout.
    #[error("{field} \"{value}\" is reserved")]
    Reserved {
        /// Which field was invalid.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A checksum string was not 64 hex characters.
    #[error("invalid checksum \"{0}\" (expected 64 hex characters)")]
    InvalidChecksum(String),

    /// A pointer locator did not name a file under the content root.
    #[error("invalid locator \"{0}\"")]
    InvalidLocator(String),
}
