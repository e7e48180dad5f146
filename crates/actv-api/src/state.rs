//! Shared handler state.

use std::sync::Arc;

use actv_issuance::RedemptionService;
use actv_store::StoreError;

use crate::auth::AdminAuth;
use crate::config::AppConfig;

/// State shared by every handler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: RedemptionService,
    pub admin: AdminAuth,
}

impl AppState {
    /// State around an existing service, with the admin guard open.
    pub fn new(service: RedemptionService) -> Self {
        Self {
            service,
            admin: AdminAuth::default(),
        }
    }

    /// Require `token` on the admin endpoints.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin = AdminAuth::new(Some(token.into()));
        self
    }

    /// Open the configured store and assemble the service.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let store = actv_store::open(&config.store).await?;
        let service = RedemptionService::new(
            store,
            config.signer.as_ref().map(Arc::clone),
            config.allowed_apps.clone(),
        );
        Ok(Self {
            service,
            admin: AdminAuth::new(config.admin_token.clone()),
        })
    }
}
