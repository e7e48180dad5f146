//! # actv-cli: Operator CLI for the Activation Service
//!
//! ## Subcommands
//!
//! - `actv keygen`: generate the license signing keypair.
//! - `actv codes generate`: mint random activation codes into a seed file.
//! - `actv seed`: load a seed file into the configured code store.
//! - `actv stats`: total / used / available counts.
//! - `actv verify`: check a license file offline, as client software does.
//!
//! ```bash
//! actv keygen --out-dir keys/
//! actv codes generate -n 100 --plan lifetime --out codes.json
//! CODE_STORE=postgres DATABASE_URL=postgres://... actv seed codes.json
//! actv verify --license license.json --public-key "$LICENSE_PUBLIC_KEY"
//! ```

pub mod codes;
pub mod keys;
pub mod verify;
