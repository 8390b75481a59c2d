/*
 * Responsibility
 * - 補助ロールヘッダ (既定 X-Auth-Roles) のロールを allow-list で絞って principal にマージ
 * - 補助ロール要件表 (AUTH_ROLES_REQUIRED) を評価し、満たさなければ 403
 * - 主たる access stage の後に動く (マージ結果は主ロール表の判定に影響しない)
 * - OPTIONS (preflight) は素通し
 */
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::access::Decision;
use crate::services::auth::SecurityContext;
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, authority_middleware))
}

async fn authority_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let supplemental = &state.supplemental;
    let path = req.uri().path().to_owned();
    let extra = supplemental.parse(req.headers());

    let decision = match req.extensions_mut().get_mut::<SecurityContext>() {
        Some(ctx) => {
            let merged = supplemental.merge(ctx, extra);
            if merged > 0 {
                tracing::debug!(merged, "supplemental roles merged");
            }
            supplemental.decide(ctx, &path)
        }
        None => supplemental.decide(&SecurityContext::anonymous(), &path),
    };

    if let Decision::Deny(denial) = decision {
        tracing::warn!(path = %path, "supplemental role requirement not met");
        return Err(denial.into());
    }

    Ok(next.run(req).await)
}
