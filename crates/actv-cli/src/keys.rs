//! # Keygen Subcommand
//!
//! Generates the Ed25519 keypair used to sign licenses. The private seed
//! goes into the service's `LICENSE_PRIVATE_KEY`; the public key is embedded
//! in client builds.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use actv_crypto::LicenseSigner;

/// Arguments for `actv keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Write `{prefix}.key` and `{prefix}.pub` here instead of printing the
    /// private seed.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// Filename prefix for the key files.
    #[arg(long, default_value = "license")]
    pub prefix: String,
}

/// Execute `actv keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let signer = LicenseSigner::generate();
    let public = signer.public_key().to_base64();
    let seed = signer.seed_base64();

    match &args.out_dir {
        Some(dir) => {
            let (key_path, pub_path) = write_keypair(dir, &args.prefix, &signer)?;
            println!("OK: generated Ed25519 license keypair");
            println!("  Private seed: {}", key_path.display());
            println!("  Public key:   {}", pub_path.display());
            println!("LICENSE_PUBLIC_KEY={public}");
        }
        None => {
            eprintln!("Keep LICENSE_PRIVATE_KEY secret. Embed LICENSE_PUBLIC_KEY in client builds.");
            println!("LICENSE_PRIVATE_KEY={}", seed.as_str());
            println!("LICENSE_PUBLIC_KEY={public}");
        }
    }
    Ok(0)
}

/// Write the base64 seed and public key to `{dir}/{prefix}.key` and
/// `{dir}/{prefix}.pub`.
pub fn write_keypair(
    dir: &Path,
    prefix: &str,
    signer: &LicenseSigner,
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let key_path = dir.join(format!("{prefix}.key"));
    let pub_path = dir.join(format!("{prefix}.pub"));

    let seed = signer.seed_base64();
    std::fs::write(&key_path, seed.as_bytes())
        .with_context(|| format!("failed to write private seed: {}", key_path.display()))?;
    std::fs::write(&pub_path, signer.public_key().to_base64())
        .with_context(|| format!("failed to write public key: {}", pub_path.display()))?;

    Ok((key_path, pub_path))
}
