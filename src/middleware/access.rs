/*
 * Responsibility
 * - パスに対するロール要件 (AccessRules) を評価する
 *   - public → 通す
 *   - principal 無し → 401 (AUTH_REQUIRED / TOKEN_EXPIRED / TOKEN_INVALID)
 *   - ロール不足 → 403 ACCESS_DENIED
 * - route_layer で掛ける (未マッチの route は 404 のまま)
 */
use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::access::Decision;
use crate::services::auth::SecurityContext;
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path().to_owned();
    let ctx = req
        .extensions()
        .get::<SecurityContext>()
        .cloned()
        .unwrap_or_default();

    match state.access.decide(&ctx, &path) {
        Decision::Allow => Ok(next.run(req).await),
        Decision::Deny(denial) => {
            tracing::warn!(
                path = %path,
                subject = ctx.principal().map(|p| p.subject.as_str()).unwrap_or("-"),
                ?denial,
                "access denied"
            );
            Err(denial.into())
        }
    }
}
