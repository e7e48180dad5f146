//! # actv-issuance: Redemption and License Issuance
//!
//! [`RedemptionService::redeem`] runs the protocol end to end:
//!
//! 1. validate the request shape and application id (no store access on failure);
//! 2. refuse if no signing key is configured (no store access either);
//! 3. look the code up (`CODE_NOT_FOUND`);
//! 4. reject expired codes whatever their status (`CODE_EXPIRED`);
//! 5. take a license serial from the store and atomically reserve the code
//!    (`CODE_USED` if another redemption got there first);
//! 6. build the license, encode it canonically, sign, attach the signature.
//!
//! Nothing is signed unless step 5 returned `Reserved` for this call, which
//! is what bounds every code to at most one signed license.

pub mod error;
pub mod issuer;
pub mod request;
pub mod service;

pub use error::{ErrorCode, RedemptionError};
pub use issuer::LicenseIssuer;
pub use request::{AllowedApps, RedeemRequest, ValidatedRequest, DEFAULT_ALLOWED_APP_IDS};
pub use service::RedemptionService;
