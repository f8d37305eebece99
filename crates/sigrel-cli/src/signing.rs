//! # Sign / Verify Subcommands
//!
//! Detached ECDSA P-256 signatures over the SHA-256 digest of a binary,
//! written as raw DER. These are the same signatures the server checks on
//! upload.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::keyring::{read_public_pem, Keyring, DEFAULT_KEYRING};

/// Arguments for `sigrel sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Binary to sign.
    #[arg(value_name = "BINARY")]
    pub binary: PathBuf,
    /// Where to write the DER signature.
    #[arg(value_name = "SIGNATURE_OUT")]
    pub signature_out: PathBuf,
    /// Keyring directory.
    #[arg(long, default_value = DEFAULT_KEYRING)]
    pub keyring: PathBuf,
}

/// Arguments for `sigrel verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Binary to check.
    #[arg(value_name = "BINARY")]
    pub binary: PathBuf,
    /// DER signature file.
    #[arg(value_name = "SIGNATURE")]
    pub signature: PathBuf,
    /// Public key as a PEM `PUBLIC KEY` file.
    #[arg(long)]
    pub pubkey: PathBuf,
}

pub fn run_sign(args: &SignArgs) -> Result<u8> {
    cmd_sign(&Keyring::new(&args.keyring), &args.binary, &args.signature_out)
}

pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    cmd_verify(&args.pubkey, &args.binary, &args.signature)
}

fn cmd_sign(keyring: &Keyring, binary: &Path, out: &Path) -> Result<u8> {
    let pair = keyring.load_private()?;
    let file =
        File::open(binary).with_context(|| format!("failed to open binary: {}", binary.display()))?;
    let signature = sigrel_crypto::sign(&pair, file)
        .with_context(|| format!("failed to sign: {}", binary.display()))?;
    fs::write(out, &signature)
        .with_context(|| format!("failed to write signature: {}", out.display()))?;

    println!("OK: wrote {} byte signature to {}", signature.len(), out.display());
    Ok(0)
}

fn cmd_verify(pubkey: &Path, binary: &Path, signature: &Path) -> Result<u8> {
    let key = read_public_pem(pubkey)?;
    let signature = fs::read(signature)
        .with_context(|| format!("failed to read signature: {}", signature.display()))?;
    let file =
        File::open(binary).with_context(|| format!("failed to open binary: {}", binary.display()))?;

    if sigrel_crypto::verify(&key, file, &signature)
        .with_context(|| format!("failed to read binary: {}", binary.display()))?
    {
        println!("OK: signature is valid");
        Ok(0)
    } else {
        println!("FAIL: signature does not match");
        Ok(1)
    }
}
