use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::auth::principal::Principal;

/// HS256 needs at least 256 bits of key material.
pub const MIN_SECRET_LEN: usize = 32;

const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token claims are invalid: {0}")]
    InvalidClaims(String),
    #[error("signing key must be at least {MIN_SECRET_LEN} bytes")]
    WeakKey,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::Malformed,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::InvalidClaims(e.to_string()),
        }
    }
}

/// Access token claims.
///
/// `roles` is optional on the wire: tokens minted elsewhere may omit it, in which case the
/// authentication stage falls back to the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Stateless HS256 token issuer/verifier.
///
/// - Key material is intentionally not printable via Debug.
/// - Expiry is checked here against the caller's clock (`now >= exp` rejects), not by
///   jsonwebtoken's leeway-based check.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], issuer: &str, ttl_seconds: u64) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::WeakKey);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: issuer.to_string(),
            ttl: Duration::seconds(ttl_seconds.min(MAX_TTL_SECONDS) as i64),
        })
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issue an access token for `principal`.
    pub fn issue(&self, principal: &Principal) -> Result<IssuedToken, TokenError> {
        self.issue_at(principal, Utc::now())
    }

    pub fn issue_at(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: principal.subject.clone(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            roles: Some(principal.role_list()),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "failed to sign JWT");
            TokenError::Signing(e.to_string())
        })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, issuer and expiry. Never panics on hostile input.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::InvalidClaims("empty 'sub' claim".to_string()));
        }
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn service() -> TokenService {
        TokenService::new(SECRET, "guarded-api", 3600).unwrap()
    }

    fn user() -> Principal {
        Principal::new("user", ["USER"])
    }

    #[test]
    fn issue_then_verify_round_trips_subject_and_roles() {
        let svc = service();
        let issued = svc.issue(&user()).unwrap();
        let claims = svc.verify(&issued.token).unwrap();

        assert_eq!(claims.sub, "user");
        assert_eq!(claims.iss, "guarded-api");
        let roles: BTreeSet<String> = claims.roles.clone().unwrap().into_iter().collect();
        assert_eq!(roles, user().roles);
        assert!(claims.expires_at() > Utc::now());
    }

    #[test]
    fn verify_is_idempotent() {
        let svc = service();
        let issued = svc.issue(&user()).unwrap();
        let first = svc.verify(&issued.token).unwrap();
        let second = svc.verify(&issued.token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_exactly_at_expiry() {
        let svc = service();
        let now = Utc::now();
        let issued = svc.issue_at(&user(), now).unwrap();

        let just_before = now + Duration::seconds(3599);
        assert!(svc.verify_at(&issued.token, just_before).is_ok());

        let at_expiry = now + Duration::seconds(3600);
        assert_eq!(
            svc.verify_at(&issued.token, at_expiry),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn expired_token_is_distinguished() {
        let svc = service();
        let issued = svc
            .issue_at(&user(), Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(svc.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = service();
        let theirs = TokenService::new(b"ffffffffffffffffffffffffffffffff", "guarded-api", 3600)
            .unwrap();
        let issued = theirs.issue(&user()).unwrap();
        assert_eq!(ours.verify(&issued.token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(service().verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(service().verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn wrong_issuer_is_invalid_claims() {
        let other = TokenService::new(SECRET, "someone-else", 3600).unwrap();
        let issued = other.issue(&user()).unwrap();
        assert!(matches!(
            service().verify(&issued.token),
            Err(TokenError::InvalidClaims(_))
        ));
    }

    #[test]
    fn short_secret_is_refused() {
        assert_eq!(
            TokenService::new(b"short", "guarded-api", 60).unwrap_err(),
            TokenError::WeakKey
        );
    }
}
