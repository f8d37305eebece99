//! # sigrel CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sigrel_cli::keys::{run_export_key, run_import_key, run_keygen};
use sigrel_cli::keys::{ExportKeyArgs, ImportKeyArgs, KeygenArgs};
use sigrel_cli::remote::{run_latest, run_upload_binary, run_upload_key};
use sigrel_cli::remote::{LatestArgs, UploadBinaryArgs, UploadKeyArgs};
use sigrel_cli::signing::{run_sign, run_verify, SignArgs, VerifyArgs};

/// Signed release publishing tool.
///
/// Manages P-256 signing keys, produces and checks detached signatures,
/// and publishes signed binaries to a sigrel server.
#[derive(Parser, Debug)]
#[command(name = "sigrel", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a P-256 key pair into the keyring.
    Keygen(KeygenArgs),
    /// Import an existing private key into the keyring.
    ImportKey(ImportKeyArgs),
    /// Print the keyring's public key in the form the server registers.
    ExportKey(ExportKeyArgs),
    /// Write a detached DER signature for a binary.
    Sign(SignArgs),
    /// Check a detached signature. Exits 1 when it does not verify.
    Verify(VerifyArgs),
    /// Register the keyring's public key with a server.
    UploadKey(UploadKeyArgs),
    /// Sign a binary and publish it.
    UploadBinary(UploadBinaryArgs),
    /// Print a coordinate's current pointer metadata.
    Latest(LatestArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Keygen(args) => run_keygen(args),
        Commands::ImportKey(args) => run_import_key(args),
        Commands::ExportKey(args) => run_export_key(args),
        Commands::Sign(args) => run_sign(args),
        Commands::Verify(args) => run_verify(args),
        Commands::UploadKey(args) => run_upload_key(args),
        Commands::UploadBinary(args) => run_upload_binary(args),
        Commands::Latest(args) => run_latest(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
