use std::collections::BTreeSet;

use axum::http::{HeaderMap, HeaderName};

use crate::config::{ConfigError, SecuritySettings};
use crate::services::access::pattern::PathPattern;
use crate::services::access::rules::{Decision, Denial};
use crate::services::auth::SecurityContext;

#[derive(Debug, Clone)]
struct Requirement {
    pattern: PathPattern,
    roles: BTreeSet<String>,
}

/// Out-of-band roles supplied through a request header (`X-Auth-Roles: A, B`).
///
/// Header roles are normalized (trimmed, deduplicated, prefixed) and only those on the
/// allow-list survive. An empty allow-list admits every role. The optional requirement table
/// is checked against every matching pattern, not only the most specific one.
#[derive(Debug, Clone)]
pub struct SupplementalRoles {
    header: HeaderName,
    prefix: Option<String>,
    allow_list: BTreeSet<String>,
    required: Vec<Requirement>,
}

impl SupplementalRoles {
    pub fn from_settings(settings: &SecuritySettings) -> Result<Self, ConfigError> {
        let header = HeaderName::try_from(settings.roles_header.trim())
            .map_err(|_| ConfigError::Invalid("AUTH_ROLES_HEADER"))?;
        let prefix = settings
            .roles_prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let allow_list = settings
            .roles_allow_list
            .iter()
            .filter_map(|r| normalize(prefix.as_deref(), r))
            .collect();

        let mut required = Vec::with_capacity(settings.roles_required.len());
        for rule in &settings.roles_required {
            let pattern = PathPattern::parse(&rule.pattern)
                .map_err(|_| ConfigError::Invalid("AUTH_ROLES_REQUIRED"))?;
            let roles = rule
                .roles
                .iter()
                .filter_map(|r| normalize(prefix.as_deref(), r))
                .collect();
            required.push(Requirement { pattern, roles });
        }

        Ok(Self {
            header,
            prefix,
            allow_list,
            required,
        })
    }

    /// Allow-listed roles carried by the request headers. Repeated headers are combined.
    pub fn parse(&self, headers: &HeaderMap) -> BTreeSet<String> {
        headers
            .get_all(&self.header)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .filter_map(|r| normalize(self.prefix.as_deref(), r))
            .filter(|r| self.allow_list.is_empty() || self.allow_list.contains(r))
            .collect()
    }

    /// Adds `extra` to the principal's roles. Anonymous contexts are left untouched.
    pub fn merge(&self, ctx: &mut SecurityContext, extra: BTreeSet<String>) -> usize {
        if extra.is_empty() {
            return 0;
        }
        let Some(principal) = ctx.principal_mut() else {
            return 0;
        };
        let before = principal.roles.len();
        principal.roles.extend(extra);
        principal.roles.len() - before
    }

    pub fn decide(&self, ctx: &SecurityContext, path: &str) -> Decision {
        let unmet = self
            .required
            .iter()
            .filter(|req| !req.roles.is_empty() && req.pattern.matches(path))
            .any(|req| match ctx.principal() {
                Some(p) => !p.has_any_role(&req.roles),
                None => true,
            });

        if unmet {
            Decision::Deny(Denial::Forbidden)
        } else {
            Decision::Allow
        }
    }
}

fn normalize(prefix: Option<&str>, raw: &str) -> Option<String> {
    let role = raw.trim();
    if role.is_empty() {
        return None;
    }
    match prefix {
        Some(prefix) if !role.starts_with(prefix) => Some(format!("{prefix}{role}")),
        _ => Some(role.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoleRule;
    use crate::services::auth::Principal;
    use axum::http::HeaderValue;

    fn settings() -> SecuritySettings {
        SecuritySettings {
            roles_allow_list: vec!["AUDITOR".into(), "REPORTER".into()],
            roles_required: vec![RoleRule::new("/api/reports/**", &["REPORTER"])],
            ..SecuritySettings::default()
        }
    }

    fn headers(values: &[&str]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for v in values {
            h.append("x-auth-roles", HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn header_roles_are_trimmed_deduplicated_and_filtered() {
        let s = SupplementalRoles::from_settings(&settings()).unwrap();
        let roles = s.parse(&headers(&[" AUDITOR , ,ROOT,AUDITOR", "REPORTER"]));
        let expected: BTreeSet<String> = ["AUDITOR".to_string(), "REPORTER".to_string()].into();
        assert_eq!(roles, expected);
    }

    #[test]
    fn empty_allow_list_admits_every_role() {
        let s = SupplementalRoles::from_settings(&SecuritySettings::default()).unwrap();
        let roles = s.parse(&headers(&["AUDITOR, OPS"]));
        let expected: BTreeSet<String> = ["AUDITOR".to_string(), "OPS".to_string()].into();
        assert_eq!(roles, expected);
    }

    #[test]
    fn prefix_is_added_when_missing() {
        let s = SupplementalRoles::from_settings(&SecuritySettings {
            roles_prefix: Some("ROLE_".into()),
            roles_allow_list: vec!["AUDITOR".into()],
            ..SecuritySettings::default()
        })
        .unwrap();
        let roles = s.parse(&headers(&["AUDITOR, ROLE_AUDITOR"]));
        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["ROLE_AUDITOR"]);
    }

    #[test]
    fn merge_only_touches_authenticated_contexts() {
        let s = SupplementalRoles::from_settings(&settings()).unwrap();
        let extra: BTreeSet<String> = ["AUDITOR".to_string()].into();

        let mut anon = SecurityContext::anonymous();
        assert_eq!(s.merge(&mut anon, extra.clone()), 0);
        assert!(anon.principal().is_none());

        let mut ctx = SecurityContext::authenticated(Principal::new("user", ["USER"]));
        assert_eq!(s.merge(&mut ctx, extra), 1);
        assert!(ctx.principal().unwrap().roles.contains("AUDITOR"));
    }

    #[test]
    fn requirement_table_forbids_missing_roles() {
        let s = SupplementalRoles::from_settings(&settings()).unwrap();
        let user = SecurityContext::authenticated(Principal::new("user", ["USER"]));
        let reporter = SecurityContext::authenticated(Principal::new("user", ["USER", "REPORTER"]));

        assert_eq!(
            s.decide(&user, "/api/reports/daily"),
            Decision::Deny(Denial::Forbidden)
        );
        assert_eq!(s.decide(&reporter, "/api/reports/daily"), Decision::Allow);
        assert_eq!(s.decide(&user, "/api/user/ping"), Decision::Allow);
        assert_eq!(
            s.decide(&SecurityContext::anonymous(), "/api/reports/daily"),
            Decision::Deny(Denial::Forbidden)
        );
    }

    #[test]
    fn every_matching_requirement_must_hold() {
        let s = SupplementalRoles::from_settings(&SecuritySettings {
            roles_required: vec![
                RoleRule::new("/api/**", &["AUDITOR"]),
                RoleRule::new("/api/reports/**", &["REPORTER"]),
            ],
            ..SecuritySettings::default()
        })
        .unwrap();
        let only_reporter = SecurityContext::authenticated(Principal::new("u", ["REPORTER"]));
        let both = SecurityContext::authenticated(Principal::new("u", ["AUDITOR", "REPORTER"]));

        assert_eq!(
            s.decide(&only_reporter, "/api/reports/x"),
            Decision::Deny(Denial::Forbidden)
        );
        assert_eq!(s.decide(&both, "/api/reports/x"), Decision::Allow);
    }

    #[test]
    fn invalid_header_name_is_a_config_error() {
        let err = SupplementalRoles::from_settings(&SecuritySettings {
            roles_header: "bad header".into(),
            ..SecuritySettings::default()
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("AUTH_ROLES_HEADER"));
    }
}
