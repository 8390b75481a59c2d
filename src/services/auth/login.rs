use std::sync::{Arc, LazyLock};

use tracing::{info, warn};

use crate::error::AppError;
use crate::services::auth::principal::Principal;
use crate::services::users::{PasswordDigest, UserDirectory};

// Compared against when the username is unknown, so both failure paths do the same work.
static DECOY: LazyLock<PasswordDigest> = LazyLock::new(|| PasswordDigest::new("decoy"));

/// Credential check for `POST /auth/login`.
#[derive(Clone)]
pub struct LoginService {
    users: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for LoginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginService").finish_non_exhaustive()
    }
}

impl LoginService {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Resolve `username`/`password` into a principal.
    ///
    /// Unknown users, wrong passwords and disabled accounts all fail with the same
    /// `AuthFailed` so the response never reveals whether a username exists.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AppError> {
        let account = self
            .users
            .find_by_username(username)
            .await
            .map_err(|e| AppError::internal(format!("user lookup failed: {e}")))?;

        let Some(account) = account else {
            std::hint::black_box(DECOY.verify(password));
            warn!("login rejected");
            return Err(AppError::AuthFailed);
        };

        if !account.password.verify(password) || !account.enabled {
            warn!("login rejected");
            return Err(AppError::AuthFailed);
        }

        info!(subject = %account.username, "login succeeded");
        Ok(Principal::new(account.username, account.roles))
    }
}
