//! # API Route Modules
//!
//! - `activate`: code redemption, the public client endpoint.
//! - `health`: operator health report, behind the admin token.

pub mod activate;
pub mod health;
