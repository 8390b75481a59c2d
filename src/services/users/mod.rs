//! User lookup collaborator ("fetch credentials and roles by username").
//!
//! The pipeline only depends on the [`UserDirectory`] trait; account persistence lives
//! behind it. [`InMemoryUserDirectory`] is the bundled implementation.

mod memory;
mod password;

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryUserDirectory;
pub use password::PasswordDigest;

#[derive(Debug, Clone)]
pub struct UserAccount {
    pub username: String,
    pub password: PasswordDigest,
    pub roles: BTreeSet<String>,
    pub enabled: bool,
}

impl UserAccount {
    pub fn new<I, R>(username: &str, password: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            username: username.to_string(),
            password: PasswordDigest::new(password),
            roles: roles.into_iter().map(Into::into).collect(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Directory backend failures (transport, storage).
///
/// Kept independent from `AppError` so callers decide how to fail: the authentication
/// stage defers to "no principal", the login endpoint surfaces an internal error.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    // Returns Ok(None) when the username is unknown.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<UserAccount>, DirectoryError>;
}
