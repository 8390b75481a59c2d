use std::collections::BTreeSet;

use crate::config::{ConfigError, SecuritySettings};
use crate::error::AppError;
use crate::services::access::pattern::PathPattern;
use crate::services::auth::{CredentialFailure, SecurityContext};

/// What a matched path asks of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AnyRole(BTreeSet<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No principal. Carries the reason a presented credential was refused, if any.
    Unauthenticated(Option<CredentialFailure>),
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated(None) => AppError::AuthRequired,
            Denial::Unauthenticated(Some(CredentialFailure::Expired)) => AppError::TokenExpired,
            Denial::Unauthenticated(Some(_)) => AppError::TokenInvalid,
            Denial::Forbidden => AppError::AccessDenied,
        }
    }
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: PathPattern,
    access: Access,
}

/// Role requirement table for the primary authorization stage.
///
/// Public paths are declared first, then role rules, so that on a specificity tie the
/// public declaration wins. Paths that match nothing only require authentication.
#[derive(Debug, Clone)]
pub struct AccessRules {
    rules: Vec<Rule>,
    fallback: Access,
}

impl AccessRules {
    pub fn from_settings(settings: &SecuritySettings) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(settings.public_paths.len() + settings.role_rules.len());

        for raw in &settings.public_paths {
            let pattern =
                PathPattern::parse(raw).map_err(|_| ConfigError::Invalid("AUTH_PUBLIC_PATHS"))?;
            rules.push(Rule {
                pattern,
                access: Access::Public,
            });
        }

        for rule in &settings.role_rules {
            let pattern = PathPattern::parse(&rule.pattern)
                .map_err(|_| ConfigError::Invalid("AUTH_ROLE_RULES"))?;
            let roles: BTreeSet<String> = rule.roles.iter().cloned().collect();
            let access = if roles.is_empty() {
                Access::Authenticated
            } else {
                Access::AnyRole(roles)
            };
            rules.push(Rule { pattern, access });
        }

        Ok(Self {
            rules,
            fallback: Access::Authenticated,
        })
    }

    /// Requirement for `path`: the most specific matching rule, first declared on a tie.
    pub fn requirement(&self, path: &str) -> &Access {
        let mut best: Option<&Rule> = None;
        for rule in self.rules.iter().filter(|r| r.pattern.matches(path)) {
            match best {
                Some(b) if b.pattern.specificity() >= rule.pattern.specificity() => {}
                _ => best = Some(rule),
            }
        }

        best.map(|r| &r.access).unwrap_or(&self.fallback)
    }

    /// Pure verdict for (security context, path).
    pub fn decide(&self, ctx: &SecurityContext, path: &str) -> Decision {
        let required = match self.requirement(path) {
            Access::Public => return Decision::Allow,
            Access::Authenticated => None,
            Access::AnyRole(roles) => Some(roles),
        };

        let Some(principal) = ctx.principal() else {
            return Decision::Deny(Denial::Unauthenticated(ctx.failure()));
        };

        match required {
            Some(roles) if !principal.has_any_role(roles) => Decision::Deny(Denial::Forbidden),
            _ => Decision::Allow,
        }
    }
}
