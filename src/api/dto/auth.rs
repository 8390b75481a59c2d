/*
 * Responsibility
 * - POST /auth/login の request / response DTO
 */
use serde::{Deserialize, Serialize};

use crate::api::validation::{Validate, Violations};
use crate::error::FieldError;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Violations::new();
        v.check(
            !self.username.trim().is_empty(),
            "username",
            "must not be blank",
            self.username.as_str(),
        );
        // never echo the password back
        v.require(!self.password.is_empty(), "password", "must not be blank");
        v.finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Always "Bearer"
    pub token_type: &'static str,
    pub access_token: String,
    pub username: String,
    pub roles: Vec<String>,
    /// Seconds until expiry.
    pub expires_in: i64,
}
