use std::collections::BTreeSet;

use serde::Serialize;

use crate::services::auth::token::TokenError;

/// Identity resolved for the current request.
///
/// - `subject` is the username carried in the token `sub` claim
/// - `roles` is kept ordered so that logs and responses are deterministic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, R>(subject: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            subject: subject.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_any_role<'a, I>(&self, required: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        required.into_iter().any(|r| self.roles.contains(r))
    }

    pub fn role_list(&self) -> Vec<String> {
        self.roles.iter().cloned().collect()
    }
}

/// Why a presented bearer credential did not produce a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    Expired,
    Invalid,
    UnknownPrincipal,
}

impl From<&TokenError> for CredentialFailure {
    fn from(err: &TokenError) -> Self {
        match err {
            TokenError::Expired => Self::Expired,
            _ => Self::Invalid,
        }
    }
}

/// Request-scoped security state installed by the authentication stage.
///
/// Either a principal is present, or it is absent with an optional record of why the
/// presented credential was refused. Never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    principal: Option<Principal>,
    failure: Option<CredentialFailure>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            failure: None,
        }
    }

    pub fn rejected(failure: CredentialFailure) -> Self {
        Self {
            principal: None,
            failure: Some(failure),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn principal_mut(&mut self) -> Option<&mut Principal> {
        self.principal.as_mut()
    }

    pub fn failure(&self) -> Option<CredentialFailure> {
        self.failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_role_intersection() {
        let p = Principal::new("user", ["USER"]);
        let admin_only = ["ADMIN".to_string()];
        let user_or_admin = ["USER".to_string(), "ADMIN".to_string()];
        assert!(!p.has_any_role(&admin_only));
        assert!(p.has_any_role(&user_or_admin));
    }

    #[test]
    fn rejected_context_has_no_principal() {
        let ctx = SecurityContext::rejected(CredentialFailure::Expired);
        assert!(ctx.principal().is_none());
        assert_eq!(ctx.failure(), Some(CredentialFailure::Expired));
    }

    #[test]
    fn token_errors_collapse_to_expired_or_invalid() {
        assert_eq!(
            CredentialFailure::from(&TokenError::Expired),
            CredentialFailure::Expired
        );
        assert_eq!(
            CredentialFailure::from(&TokenError::InvalidSignature),
            CredentialFailure::Invalid
        );
        assert_eq!(
            CredentialFailure::from(&TokenError::Malformed),
            CredentialFailure::Invalid
        );
    }
}
