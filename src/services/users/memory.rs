use std::collections::HashMap;

use async_trait::async_trait;

use super::{DirectoryError, UserAccount, UserDirectory};

/// Process-local directory, read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    accounts: HashMap<String, UserAccount>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory with the two bootstrap accounts (`user`/`USER`, `admin`/`ADMIN`).
    pub fn seeded() -> Self {
        Self::new()
            .with_account(UserAccount::new("user", "password", ["USER"]))
            .with_account(UserAccount::new("admin", "password", ["ADMIN"]))
    }

    pub fn with_account(mut self, account: UserAccount) -> Self {
        self.accounts.insert(account.username.clone(), account);
        self
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, DirectoryError> {
        Ok(self.accounts.get(username).cloned())
    }
}
