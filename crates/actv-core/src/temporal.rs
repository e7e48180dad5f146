//! # Temporal Types: UTC-Only Timestamps
//!
//! `Timestamp` is the only time type that appears in licenses and code
//! records. It is UTC with whole-second precision and always renders as
//! `YYYY-MM-DDTHH:MM:SSZ`, so the same instant always contributes the same
//! bytes to a signed license.
//!
//! Strict parsing ([`Timestamp::parse()`]) accepts only the `Z` suffix. Seed
//! files go through [`Timestamp::parse_lenient()`], which converts any
//! RFC 3339 offset to UTC. Both refuse fractional seconds: an expiry is
//! stored exactly as written or not at all. Clock readings
//! ([`Timestamp::now()`], [`Timestamp::from_utc()`]) truncate instead,
//! which never moves a whole-second expiry check earlier.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string that ends in `Z`.
    ///
    /// Explicit offsets, including `+00:00`, are rejected.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(invalid(s, "must use Z suffix (UTC only)"));
        }
        Self::parse_lenient(s)
    }

    /// Parse any RFC 3339 string and convert it to UTC.
    ///
    /// Fractional seconds are rejected, including `.000`.
    pub fn parse_lenient(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| invalid(s, &e.to_string()))?;
        if s.contains('.') || dt.nanosecond() != 0 {
            return Err(invalid(s, "fractional seconds are not supported"));
        }
        Ok(Self(dt.with_timezone(&Utc)))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as ISO 8601 with Z suffix (e.g. `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// The UTC calendar date as `YYYYMMDD`.
    pub fn compact_date(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// True once `now` has reached this instant.
    ///
    /// An expiry equal to `now` counts as passed.
    pub fn has_passed(&self, now: &Timestamp) -> bool {
        now.0 >= self.0
    }

    /// Shift by a whole number of seconds (negative moves backwards).
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + chrono::Duration::seconds(secs))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_lenient(&s).map_err(serde::de::Error::custom)
    }
}

fn invalid(value: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidTimestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
