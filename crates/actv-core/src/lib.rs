//! # actv-core: Foundational Types for the Activation Service
//!
//! This crate is the leaf of the activation workspace. It defines the
//! primitives every other crate builds on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every byte sequence that gets signed or
//!    verified flows through `CanonicalBytes::new()`. No raw
//!    `serde_json::to_vec()` on a signing path. The offline verifier shipped
//!    with client software recomputes exactly these bytes.
//!
//! 2. **Newtype wrappers for identifiers.** `CodeId`, `DeviceHash`, `AppId`,
//!    `LicenseId`: validated constructors, no bare strings crossing crate
//!    boundaries.
//!
//! 3. **UTC-only timestamps.** `Timestamp` enforces UTC with `Z` suffix and
//!    seconds precision, so the same instant always encodes to the same bytes.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `actv-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use error::{CanonicalizationError, CoreError, CryptoError, ValidationError};
pub use identity::{AppId, CodeId, DeviceHash, LicenseId};
pub use temporal::Timestamp;
