/*
 * Responsibility
 * - 環境変数や設定の読み込み (署名鍵、発行者、ロール表、allow-list など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 起動後は不変 (hot-reload なし)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// One `pattern=ROLE|ROLE` entry of a role table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRule {
    pub pattern: String,
    pub roles: Vec<String>,
}

impl RoleRule {
    pub fn new(pattern: &str, roles: &[&str]) -> Self {
        Self {
            pattern: pattern.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Route protection and supplemental-role settings.
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub public_paths: Vec<String>,
    pub role_rules: Vec<RoleRule>,

    // X-Auth-Roles side channel
    pub roles_header: String,
    pub roles_prefix: Option<String>,
    pub roles_allow_list: Vec<String>,
    pub roles_required: Vec<RoleRule>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            public_paths: vec![
                "/auth/login".to_string(),
                "/api/public/**".to_string(),
                "/health".to_string(),
            ],
            role_rules: vec![
                RoleRule::new("/api/admin/**", &["ADMIN"]),
                RoleRule::new("/api/user/**", &["USER", "ADMIN"]),
            ],
            roles_header: "X-Auth-Roles".to_string(),
            roles_prefix: None,
            roles_allow_list: Vec::new(),
            roles_required: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub body_limit_bytes: usize,
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            body_limit_bytes: 1024 * 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub jwt_secret: Vec<u8>,
    pub jwt_issuer: String,
    pub access_token_ttl_seconds: u64,

    pub http: HttpSettings,
    pub security: SecuritySettings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("http", &self.http)
            .field("security", &self.security)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (env, map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let jwt_secret = lookup("AUTH_JWT_SECRET").ok_or(ConfigError::Missing("AUTH_JWT_SECRET"))?;
        let jwt_secret = STANDARD
            .decode(jwt_secret.trim())
            .map_err(|_| ConfigError::Invalid("AUTH_JWT_SECRET"))?;

        let jwt_issuer = lookup("AUTH_ISSUER")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("AUTH_ISSUER"))?;

        let access_token_ttl_seconds = match lookup("ACCESS_TOKEN_TTL_SECONDS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"))?,
            None => 3600,
        };

        let defaults = HttpSettings::default();
        let http = HttpSettings {
            body_limit_bytes: lookup("HTTP_BODY_LIMIT_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.body_limit_bytes),
            timeout: lookup("HTTP_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        let mut security = SecuritySettings::default();
        if let Some(raw) = lookup("AUTH_PUBLIC_PATHS") {
            security.public_paths = split_list(&raw, ',');
        }
        if let Some(raw) = lookup("AUTH_ROLE_RULES") {
            security.role_rules =
                parse_role_rules(&raw).ok_or(ConfigError::Invalid("AUTH_ROLE_RULES"))?;
        }
        if let Some(raw) = lookup("AUTH_ROLES_HEADER").filter(|s| !s.trim().is_empty()) {
            security.roles_header = raw.trim().to_string();
        }
        security.roles_prefix = lookup("AUTH_ROLES_PREFIX")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(raw) = lookup("AUTH_ROLES_ALLOW_LIST") {
            security.roles_allow_list = split_list(&raw, ',');
        }
        if let Some(raw) = lookup("AUTH_ROLES_REQUIRED") {
            security.roles_required =
                parse_role_rules(&raw).ok_or(ConfigError::Invalid("AUTH_ROLES_REQUIRED"))?;
        }

        Ok(Self {
            addr,
            app_env,
            jwt_secret,
            jwt_issuer,
            access_token_ttl_seconds,
            http,
            security,
        })
    }
}

fn split_list(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// `/api/admin/**=ADMIN;/api/user/**=USER|ADMIN`
fn parse_role_rules(raw: &str) -> Option<Vec<RoleRule>> {
    split_list(raw, ';')
        .into_iter()
        .map(|entry| {
            let (pattern, roles) = entry.split_once('=')?;
            let pattern = pattern.trim();
            let roles = split_list(roles, '|');
            if pattern.is_empty() || roles.is_empty() {
                return None;
            }
            Some(RoleRule {
                pattern: pattern.to_string(),
                roles,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET_B64: &str = "MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDE=";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let config = Config::from_lookup(lookup(&[
            ("AUTH_JWT_SECRET", SECRET_B64),
            ("AUTH_ISSUER", "guarded-api"),
        ]))
        .unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.jwt_secret.len(), 32);
        assert_eq!(config.access_token_ttl_seconds, 3600);
        assert_eq!(config.security.roles_header, "X-Auth-Roles");
        assert!(config.security.roles_allow_list.is_empty());
        assert_eq!(config.security.role_rules.len(), 2);
    }

    #[test]
    fn missing_secret_is_reported() {
        let err = Config::from_lookup(lookup(&[("AUTH_ISSUER", "guarded-api")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("AUTH_JWT_SECRET"));
    }

    #[test]
    fn secret_must_be_base64() {
        let err = Config::from_lookup(lookup(&[
            ("AUTH_JWT_SECRET", "not base64 !!"),
            ("AUTH_ISSUER", "guarded-api"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("AUTH_JWT_SECRET"));
    }

    #[test]
    fn role_tables_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("AUTH_JWT_SECRET", SECRET_B64),
            ("AUTH_ISSUER", "guarded-api"),
            ("AUTH_ROLE_RULES", "/api/ops/**=OPS|ADMIN; /api/admin/**=ADMIN"),
            ("AUTH_ROLES_ALLOW_LIST", "AUDITOR, OPS"),
            ("AUTH_ROLES_REQUIRED", "/api/reports/**=AUDITOR"),
            ("AUTH_ROLES_PREFIX", "ROLE_"),
            ("APP_ENV", "prod"),
        ]))
        .unwrap();

        assert!(config.app_env.is_production());
        assert_eq!(
            config.security.role_rules,
            vec![
                RoleRule::new("/api/ops/**", &["OPS", "ADMIN"]),
                RoleRule::new("/api/admin/**", &["ADMIN"]),
            ]
        );
        assert_eq!(config.security.roles_allow_list, vec!["AUDITOR", "OPS"]);
        assert_eq!(
            config.security.roles_required,
            vec![RoleRule::new("/api/reports/**", &["AUDITOR"])]
        );
        assert_eq!(config.security.roles_prefix.as_deref(), Some("ROLE_"));
    }

    #[test]
    fn malformed_role_rule_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("AUTH_JWT_SECRET", SECRET_B64),
            ("AUTH_ISSUER", "guarded-api"),
            ("AUTH_ROLE_RULES", "/api/admin/**"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("AUTH_ROLE_RULES"));
    }
}
