//! # actv-state: Activation Code Lifecycle and License Record
//!
//! - [`code`]: the `ActivationCode` record owned by the code store, with its
//!   one-way `Unused → Used` transition.
//! - [`license`]: the `License` value record built once per redemption,
//!   encoded canonically and signed.
//!
//! The `Used` state carries its redemption metadata inside the enum variant,
//! so a used code without a bound device, license id and timestamp cannot be
//! constructed.

pub mod code;
pub mod license;

pub use code::{ActivationCode, CodeError, CodeLifecycle, CodeStatus, Plan, Redemption};
pub use license::{FeatureFlags, License, LICENSE_SCHEMA_VERSION};
