//! # sigrel-cli — Publisher and Operator CLI
//!
//! Provides the `sigrel` command-line interface used to manage signing
//! keys and to push releases to a sigrel server.
//!
//! ## Subcommands
//!
//! - `sigrel keygen` / `import-key` / `export-key`: keyring management.
//! - `sigrel sign` / `verify`: detached P-256 signatures over a binary.
//! - `sigrel upload-key`: register the keyring's public key with a server.
//! - `sigrel upload-binary`: sign locally and publish a release.
//! - `sigrel latest`: print a coordinate's current pointer metadata.
//!
//! ```bash
//! sigrel keygen --keyring ./keyring
//! sigrel upload-key --server http://localhost:8080 --password "$PW"
//! sigrel upload-binary app stable linux x64 1.4.0 ./dist/app --server http://localhost:8080
//! ```
//!
//! Handlers return `anyhow::Result<u8>`; the `u8` becomes the process
//! exit code.

pub mod client;
pub mod keyring;
pub mod keys;
pub mod remote;
pub mod signing;
