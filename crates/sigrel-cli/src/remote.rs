//! # Server Subcommands
//!
//! `upload-key`, `upload-binary` and `latest`. Each builds a
//! current-thread Tokio runtime for the duration of one request.

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sigrel_core::{Coordinate, FileName, Version};
use sigrel_crypto::{digest_file, sign_digest, KeyPair};

use crate::client::ReleaseClient;
use crate::keyring::{Keyring, DEFAULT_KEYRING};

/// The four coordinate segments, shared by release subcommands.
#[derive(Args, Debug)]
pub struct CoordinateArgs {
    /// Component name.
    pub component: String,
    /// Release channel.
    pub channel: String,
    /// Operating system.
    pub os: String,
    /// Architecture.
    pub arch: String,
}

impl CoordinateArgs {
    fn to_coordinate(&self) -> Result<Coordinate> {
        Coordinate::new(&self.component, &self.channel, &self.os, &self.arch)
            .context("invalid coordinate")
    }
}

/// Arguments for `sigrel upload-key`.
#[derive(Args, Debug)]
pub struct UploadKeyArgs {
    /// Server base URL, e.g. `http://localhost:8080`.
    #[arg(long)]
    pub server: String,
    /// Shared key-registration password.
    #[arg(long)]
    pub password: String,
    /// Keyring directory.
    #[arg(long, default_value = DEFAULT_KEYRING)]
    pub keyring: PathBuf,
}

/// Arguments for `sigrel upload-binary`.
#[derive(Args, Debug)]
pub struct UploadBinaryArgs {
    #[command(flatten)]
    pub coordinate: CoordinateArgs,
    /// Version to publish.
    pub version: String,
    /// Binary to sign and upload.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// Server base URL.
    #[arg(long)]
    pub server: String,
    /// Private key as base64 SEC1 DER, instead of the keyring.
    #[arg(long)]
    pub key: Option<String>,
    /// Keyring directory.
    #[arg(long, default_value = DEFAULT_KEYRING)]
    pub keyring: PathBuf,
}

/// Arguments for `sigrel latest`.
#[derive(Args, Debug)]
pub struct LatestArgs {
    #[command(flatten)]
    pub coordinate: CoordinateArgs,
    /// Server base URL.
    #[arg(long)]
    pub server: String,
}

pub fn run_upload_key(args: &UploadKeyArgs) -> Result<u8> {
    let public = Keyring::new(&args.keyring).load_public()?;
    let client = ReleaseClient::new(&args.server)?;
    block_on(client.add_key(&args.password, &public))?
        .with_context(|| format!("key registration with {} failed", client.base_url()))?;
    println!("OK: registered {}", public.encoded());
    Ok(0)
}

pub fn run_upload_binary(args: &UploadBinaryArgs) -> Result<u8> {
    let coordinate = args.coordinate.to_coordinate()?;
    let version = Version::new(args.version.as_str()).context("invalid version")?;
    let file_name = FileName::from_upload(args.file.to_str())
        .with_context(|| format!("unusable file name: {}", args.file.display()))?;

    let pair = match &args.key {
        Some(encoded) => KeyPair::from_base64(encoded).context("invalid --key")?,
        None => Keyring::new(&args.keyring).load_private()?,
    };
    let digest = digest_file(&args.file)
        .with_context(|| format!("failed to hash {}", args.file.display()))?;
    let signature = sign_digest(&pair, &digest).context("failed to sign binary")?;
    tracing::info!(checksum = %digest, file = %file_name, "signed binary");

    let client = ReleaseClient::new(&args.server)?;
    block_on(client.upload_binary(
        &coordinate,
        &version,
        &args.file,
        file_name.as_str(),
        signature,
    ))?
    .context("upload failed")?;

    println!("OK: published {coordinate} {version}");
    println!("  checksum: {digest}");
    Ok(0)
}

pub fn run_latest(args: &LatestArgs) -> Result<u8> {
    let coordinate = args.coordinate.to_coordinate()?;
    let client = ReleaseClient::new(&args.server)?;
    let metadata = block_on(client.latest(&coordinate))?.context("lookup failed")?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(0)
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
