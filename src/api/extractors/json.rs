use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

use crate::api::validation::Validate;
use crate::error::AppError;

/// `Json<T>` that also runs `T::validate`.
///
/// - unreadable / mistyped body → `BAD_REQUEST`
/// - validation failure → `VALIDATION_ERROR` with field errors
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate().map_err(AppError::validation)?;
        Ok(Self(value))
    }
}
