//! Redemption request shape and validation.

use serde::Deserialize;

use actv_core::identity::validate_text;
use actv_core::{AppId, CodeId, DeviceHash, ValidationError};

use crate::error::RedemptionError;

/// Application ids accepted when none are configured.
pub const DEFAULT_ALLOWED_APP_IDS: &[&str] = &["moments_ai"];

const MAX_APP_VERSION_LEN: usize = 64;

/// A redemption request as received. Every field is required, but absence
/// is reported as `INVALID_REQUEST` by [`RedeemRequest::validate`] rather
/// than by the deserializer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedeemRequest {
    pub code: Option<String>,
    pub device_hash: Option<String>,
    pub app_id: Option<String>,
    pub app_version: Option<String>,
}

/// A request that passed shape and allow-list checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub code: CodeId,
    pub device_hash: DeviceHash,
    pub app_id: AppId,
    pub app_version: String,
}

/// Application ids permitted to redeem codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedApps(Vec<String>);

impl AllowedApps {
    /// Allow exactly these ids. Blank entries are dropped.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            ids.into_iter()
                .map(Into::into)
                .map(|s: String| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Parse a comma-separated list, as in `ALLOWED_APP_IDS`.
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Whether `app_id` may redeem.
    pub fn contains(&self, app_id: &str) -> bool {
        self.0.iter().any(|a| a == app_id)
    }

    /// The configured ids.
    pub fn ids(&self) -> &[String] {
        &self.0
    }
}

impl Default for AllowedApps {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_APP_IDS.iter().copied())
    }
}

impl RedeemRequest {
    /// Check every field and the application allow-list. Pure: touches no
    /// store.
    pub fn validate(&self, allowed: &AllowedApps) -> Result<ValidatedRequest, RedemptionError> {
        let code = CodeId::new(required("code", &self.code)?).map_err(invalid)?;
        let device_hash =
            DeviceHash::new(required("device_hash", &self.device_hash)?).map_err(invalid)?;
        let app_id = AppId::new(required("app_id", &self.app_id)?).map_err(invalid)?;
        let app_version = required("app_version", &self.app_version)?;
        validate_text("app_version", app_version, MAX_APP_VERSION_LEN).map_err(invalid)?;

        if !allowed.contains(app_id.as_str()) {
            return Err(RedemptionError::InvalidAppId(app_id.to_string()));
        }

        Ok(ValidatedRequest {
            code,
            device_hash,
            app_id,
            app_version: app_version.to_string(),
        })
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, RedemptionError> {
    value
        .as_deref()
        .ok_or_else(|| invalid(ValidationError::Missing { field }))
}

fn invalid(err: ValidationError) -> RedemptionError {
    RedemptionError::InvalidRequest(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RedeemRequest {
        RedeemRequest {
            code: Some("ACT-abc".into()),
            device_hash: Some("SHA256:abc".into()),
            app_id: Some("moments_ai".into()),
            app_version: Some("1.2.0".into()),
        }
    }

    #[test]
    fn valid_request_passes() {
        let v = request().validate(&AllowedApps::default()).unwrap();
        assert_eq!(v.code.as_str(), "ACT-abc");
        assert_eq!(v.app_version, "1.2.0");
    }

    #[test]
    fn missing_fields_are_invalid_request() {
        for field in ["code", "device_hash", "app_id", "app_version"] {
            let mut r = request();
            match field {
                "code" => r.code = None,
                "device_hash" => r.device_hash = None,
                "app_id" => r.app_id = None,
                _ => r.app_version = None,
            }
            let err = r.validate(&AllowedApps::default()).unwrap_err();
            assert!(
                matches!(&err, RedemptionError::InvalidRequest(msg) if msg == &format!("{field} is required")),
                "{field}: {err:?}"
            );
        }
    }

    #[test]
    fn blank_field_is_invalid_request() {
        let mut r = request();
        r.device_hash = Some("  ".into());
        assert!(matches!(
            r.validate(&AllowedApps::default()),
            Err(RedemptionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn unknown_app_is_rejected() {
        let mut r = request();
        r.app_id = Some("other_app".into());
        assert!(matches!(
            r.validate(&AllowedApps::default()),
            Err(RedemptionError::InvalidAppId(id)) if id == "other_app"
        ));
    }

    #[test]
    fn malformed_request_reported_before_app_check() {
        let r = RedeemRequest {
            app_id: Some("other_app".into()),
            ..Default::default()
        };
        assert!(matches!(
            r.validate(&AllowedApps::default()),
            Err(RedemptionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn allow_list_parsing() {
        let allowed = AllowedApps::parse_list(" moments_ai, desk_app ,,");
        assert_eq!(allowed.ids(), ["moments_ai", "desk_app"]);
        assert!(allowed.contains("desk_app"));
        assert!(!allowed.contains("moments"));
    }
}
