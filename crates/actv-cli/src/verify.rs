//! # Offline License Verification
//!
//! Checks a license file the way client software does after activation:
//!
//! 1. remove `signature` from the JSON object,
//! 2. canonically encode what remains,
//! 3. check the `ed25519:` tag and verify against the embedded public key,
//! 4. check the license is bound to this device and not expired.
//!
//! Only the signature step needs the key; the remaining checks read fields
//! the signature already vouches for.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use thiserror::Error;

use actv_core::{CanonicalizationError, CryptoError, Timestamp};
use actv_crypto::{LicensePublicKey, TaggedSignature};
use actv_state::license::detach_signature;
use actv_state::License;

/// Arguments for `actv verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// License JSON file as returned by the activation endpoint.
    #[arg(long)]
    pub license: PathBuf,
    /// Base64 Ed25519 public key.
    #[arg(long, env = "LICENSE_PUBLIC_KEY")]
    pub public_key: String,
    /// Require the license to be bound to this device fingerprint.
    #[arg(long)]
    pub device_hash: Option<String>,
    /// Evaluate expiry at this instant instead of now (ISO 8601 UTC).
    #[arg(long, value_parser = parse_timestamp)]
    pub at: Option<Timestamp>,
}

fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    Timestamp::parse(s).map_err(|e| e.to_string())
}

/// Why a license was not accepted.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("license is not a JSON object")]
    NotAnObject,

    #[error("license has no signature")]
    Unsigned,

    #[error("malformed signature: {0}")]
    MalformedSignature(#[source] CryptoError),

    #[error("license contents cannot be canonically encoded: {0}")]
    Encoding(#[from] CanonicalizationError),

    #[error("signature does not match license contents")]
    BadSignature,

    #[error("license fields are malformed: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("license is bound to device {bound}, not {presented}")]
    DeviceMismatch { bound: String, presented: String },

    #[error("license expired at {expires_at}")]
    Expired { expires_at: Timestamp },
}

/// Verify `license` against `public_key`, then check device binding and
/// expiry at `now`.
pub fn verify_license(
    license: Value,
    public_key: &LicensePublicKey,
    device_hash: Option<&str>,
    now: Timestamp,
) -> Result<License, VerifyError> {
    if !license.is_object() {
        return Err(VerifyError::NotAnObject);
    }

    let (payload, signature) = detach_signature(license.clone())?;
    let signature = signature.ok_or(VerifyError::Unsigned)?;
    let tagged = TaggedSignature::parse(&signature).map_err(VerifyError::MalformedSignature)?;
    public_key
        .verify(&payload, tagged.signature())
        .map_err(|_| VerifyError::BadSignature)?;

    let license: License = serde_json::from_value(license).map_err(VerifyError::Malformed)?;

    if let Some(presented) = device_hash {
        if license.device_hash.as_str() != presented {
            return Err(VerifyError::DeviceMismatch {
                bound: license.device_hash.to_string(),
                presented: presented.to_string(),
            });
        }
    }
    if license.expires_at.has_passed(&now) {
        return Err(VerifyError::Expired {
            expires_at: license.expires_at,
        });
    }
    Ok(license)
}

/// Execute `actv verify`.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let public_key =
        LicensePublicKey::from_base64(&args.public_key).context("invalid public key")?;
    let content = std::fs::read_to_string(&args.license)
        .with_context(|| format!("failed to read license: {}", args.license.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JSON: {}", args.license.display()))?;

    let now = args.at.unwrap_or_else(Timestamp::now);
    match verify_license(value, &public_key, args.device_hash.as_deref(), now) {
        Ok(license) => {
            println!("OK: license is valid");
            println!("  License id: {}", license.license_id);
            println!("  Plan:       {}", license.plan);
            println!("  Device:     {}", license.device_hash);
            println!("  Expires:    {}", license.expires_at);
            Ok(0)
        }
        Err(e) => {
            println!("FAIL: {e}");
            Ok(1)
        }
    }
}
