use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_rds::auth_token::{AuthTokenGenerator, Config};
use product_catalog_core::settings::DbSettings;

use crate::error::DbAccessError;

/// Source of the short-lived password presented to the IAM-auth proxy.
#[async_trait]
pub trait AuthTokenSource: Send + Sync {
    async fn auth_token(&self, settings: &DbSettings) -> Result<String, DbAccessError>;
}

/// Signs `connect` tokens locally with the function's execution role.
#[derive(Clone)]
pub struct RdsAuthTokenSource {
    sdk_config: SdkConfig,
}

impl RdsAuthTokenSource {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }
}

#[async_trait]
impl AuthTokenSource for RdsAuthTokenSource {
    async fn auth_token(&self, settings: &DbSettings) -> Result<String, DbAccessError> {
        let config = Config::builder()
            .hostname(settings.host.as_str())
            .port(u64::from(settings.port))
            .username(settings.user.as_str())
            .build()
            .map_err(|error| DbAccessError::AuthToken(error.to_string()))?;

        let token = AuthTokenGenerator::new(config)
            .auth_token(&self.sdk_config)
            .await
            .map_err(|error| DbAccessError::AuthToken(error.to_string()))?;

        Ok(token.as_str().to_string())
    }
}

#[async_trait]
impl<T: AuthTokenSource + ?Sized> AuthTokenSource for &T {
    async fn auth_token(&self, settings: &DbSettings) -> Result<String, DbAccessError> {
        (**self).auth_token(settings).await
    }
}
