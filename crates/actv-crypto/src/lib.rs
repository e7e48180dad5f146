//! # actv-crypto: License Signing Primitives
//!
//! Ed25519 signing and verification for issued licenses:
//!
//! - [`LicenseSigner`] holds the issuer's private key, loaded once at process
//!   start from a base64 32-byte seed. It signs only `&CanonicalBytes`.
//! - [`LicensePublicKey`] is what client software embeds to verify offline.
//! - [`TaggedSignature`] is the wire form attached to a license,
//!   `ed25519:<base64>`.
//! - [`sign`] / [`verify`] operate on raw byte slices for the offline
//!   verifier and key tooling. `verify` never panics and returns `false` on
//!   any malformed input.
//!
//! ## Crate Policy
//!
//! - Depends only on `actv-core` internally.
//! - No mocking of cryptographic operations in tests.
//! - Private key material is never serialized, logged or printed by `Debug`.

pub mod ed25519;

pub use ed25519::{
    generate_keypair, sign, verify, LicensePublicKey, LicenseSignature, LicenseSigner,
    TaggedSignature, SIGNATURE_ALGORITHM,
};
