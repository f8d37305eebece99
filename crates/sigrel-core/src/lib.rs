#![deny(missing_docs)]

//! # sigrel-core — Foundational Types for the Signed Release Server
//!
//! Defines the types every other crate in the workspace depends on. It has
//! no internal crate dependencies, only `serde`, `serde_json` and `thiserror`.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for path segments.** A [`Coordinate`] is built from
//!    validated [`Segment`]s and a [`Version`] is its own type. Anything that
//!    reaches the filesystem has already been checked for path safety, so the
//!    storage layer never joins raw request strings onto its root.
//!
//! 2. **[`ContentDigest`] is the only checksum representation.** Stored and
//!    transmitted as 64 lowercase hex characters.
//!
//! 3. **[`PointerMetadata`] is the wire record.** The same struct is written to
//!    disk and returned over HTTP, so the two can never drift apart.

pub mod coordinate;
pub mod digest;
pub mod error;
pub mod pointer;

pub use coordinate::{Coordinate, FileName, Segment, Version, LATEST};
pub use digest::ContentDigest;
pub use error::ValidationError;
pub use pointer::{ListingEntry, PointerMetadata};
