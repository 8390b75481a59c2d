/*
 * Responsibility
 * - Router / middleware に紐づける共有コンテキスト (AppState)
 *   - 署名鍵・ロール表・allow-list など、起動後は読み取り専用
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::services::access::{AccessRules, SupplementalRoles};
use crate::services::auth::{LoginService, TokenService};
use crate::services::users::UserDirectory;

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserDirectory>,
    pub login: Arc<LoginService>,
    pub access: Arc<AccessRules>,
    pub supplemental: Arc<SupplementalRoles>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .field("access", &self.access)
            .field("supplemental", &self.supplemental)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        tokens: Arc<TokenService>,
        users: Arc<dyn UserDirectory>,
        login: Arc<LoginService>,
        access: Arc<AccessRules>,
        supplemental: Arc<SupplementalRoles>,
    ) -> Self {
        Self {
            tokens,
            users,
            login,
            access,
            supplemental,
        }
    }
}
