use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::{Principal, SecurityContext};

/// Handler で認証済み Principal を受け取るための extractor
/// authenticate stage が SecurityContext を extensions に insert 済みである前提
/// principal が無い場合は 401 AUTH_REQUIRED (public route で使った場合など)
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(SecurityContext::principal)
            .cloned()
            .map(CurrentPrincipal)
            .ok_or(AppError::AuthRequired)
    }
}
