/*
 * Responsibility
 * - Authorization: Bearer <jwt> を検証し、SecurityContext を request extensions に載せる
 * - ここでは拒否しない (401/403 の判断は access stage に一本化)
 *   - ヘッダ無し / 他スキーム → anonymous
 *   - 検証失敗 → rejected(理由) として次へ
 * - claims に roles が無い場合は UserDirectory から現在のロールを引く
 */
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::services::auth::{Claims, CredentialFailure, Principal, SecurityContext};
use crate::state::AppState;

const BEARER: &str = "Bearer ";

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, authenticate_middleware))
}

async fn authenticate_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER))
        .map(str::trim)
        .map(str::to_string);

    let ctx = match token {
        None => SecurityContext::anonymous(),
        Some(token) => resolve(&state, &token).await,
    };

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

async fn resolve(state: &AppState, token: &str) -> SecurityContext {
    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(error = %err, "access token verification failed");
            return SecurityContext::rejected(CredentialFailure::from(&err));
        }
    };

    match principal_from(state, claims).await {
        Some(principal) => SecurityContext::authenticated(principal),
        None => SecurityContext::rejected(CredentialFailure::UnknownPrincipal),
    }
}

// Token roles take precedence; without them the directory supplies the current roles.
async fn principal_from(state: &AppState, claims: Claims) -> Option<Principal> {
    if let Some(roles) = claims.roles {
        return Some(Principal::new(claims.sub, roles));
    }

    match state.users.find_by_username(&claims.sub).await {
        Ok(Some(account)) if account.enabled => Some(Principal::new(claims.sub, account.roles)),
        Ok(_) => {
            tracing::warn!(subject = %claims.sub, "token subject not found in directory");
            None
        }
        Err(err) => {
            tracing::error!(subject = %claims.sub, error = %err, "role lookup failed");
            None
        }
    }
}
