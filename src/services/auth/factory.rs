/// Factory: build auth services from application `Config`.
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::services::auth::{LoginService, TokenService};
use crate::services::users::UserDirectory;

pub fn build_token_service(config: &Config) -> Result<Arc<TokenService>, ConfigError> {
    let tokens = TokenService::new(
        &config.jwt_secret,
        &config.jwt_issuer,
        config.access_token_ttl_seconds,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "failed to build token service");
        ConfigError::Invalid("AUTH_JWT_SECRET")
    })?;

    Ok(Arc::new(tokens))
}

pub fn build_login_service(users: Arc<dyn UserDirectory>) -> Arc<LoginService> {
    Arc::new(LoginService::new(users))
}
