/*
 * Responsibility
 * - 各 stage の順序を一箇所で固定する (外側 → 内側)
 *   1. correlation   : trace id / 開始時刻、X-Request-Id を必ず返す
 *   2. trace         : アクセスログ (span に trace id)
 *   3. envelope      : 出口でエラー / 成功レスポンスを 1 回だけ描画
 *   4. http guards   : timeout / panic / body limit
 *   5. authenticate  : SecurityContext を載せる (拒否しない)
 *   6. access        : ロール表 → 401 / 403
 *   7. authority     : 補助ロールのマージと要件表 → 403
 *   8. handler
 */
use axum::{Router, middleware::from_fn};

use crate::config::HttpSettings;
use crate::state::AppState;

pub mod access;
pub mod authenticate;
pub mod authority;
pub mod correlation;
pub mod envelope;
pub mod http;

pub fn apply(router: Router<AppState>, state: AppState, settings: &HttpSettings) -> Router {
    // route_layer / layer wrap what is already there, so the innermost stage goes first.
    let router = authority::apply(router, state.clone());
    let router = access::apply(router, state.clone());
    let router = authenticate::apply(router, state.clone());
    let router = router.with_state(state);

    let router = http::apply_guards(router, settings);
    let router = router.layer(from_fn(envelope::envelope_middleware));
    let router = http::apply_trace(router);
    router.layer(from_fn(correlation::correlation_middleware))
}
