//! # sigrel-store — Durable State and the Publish Pipeline
//!
//! Everything that touches the server's working directory lives here:
//!
//! ```text
//! {root}/
//!   keystore.json                      trust store
//!   staging/upload-<uuid>-<rand>/      one per in-flight upload
//!   content/{component}/{channel}/{os}/{arch}/
//!     version.json                     coordinate pointer (latest)
//!     {version}/
//!       {file}                         the binary
//!       signature.der                  detached DER signature
//!       version.json                   per-version pointer (immutable)
//! ```
//!
//! [`Workspace`] is the single handle built at startup. It hands out the
//! [`TrustStore`], [`ArtifactStore`], [`Publisher`] and [`QueryService`],
//! all of which are cheap to clone and safe to share across tasks.
//!
//! ## Concurrency
//!
//! Staging and verification run fully in parallel. Only the commit step
//! is serialized, per coordinate, so the coordinate pointer always
//! describes exactly one commit. Different coordinates never contend.

pub mod artifact;
pub mod error;
mod fsutil;
pub mod publish;
pub mod query;
pub mod staging;
pub mod trust;
pub mod workspace;

pub use artifact::{ArtifactStore, Browse, StagedArtifact};
pub use error::StoreError;
pub use publish::{PublishOutcome, Publisher};
pub use query::{BinaryContent, QueryService};
pub use staging::{StagedWriter, StagingArea, MAX_SIGNATURE_BYTES};
pub use trust::TrustStore;
pub use workspace::Workspace;
