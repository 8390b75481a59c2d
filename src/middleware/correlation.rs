/*
 * Responsibility
 * - リクエスト毎の trace id / 開始時刻 (CorrelationContext) を作る
 *   - X-Request-Id が来ていれば再利用、無ければ UUID を採番
 * - task-local に載せて下流 (error 描画、ログ) から参照できるようにする
 * - どの経路で終わっても response に X-Request-Id を付ける
 */
use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

tokio::task_local! {
    static CURRENT: CorrelationContext;
}

/// Per-request trace id and start time. Immutable once created.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    trace_id: String,
    started_at: Instant,
}

impl CorrelationContext {
    /// Reuse a non-blank inbound id, otherwise generate a fresh one.
    pub fn begin(inbound: Option<&str>) -> Self {
        let trace_id = inbound
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            trace_id,
            started_at: Instant::now(),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Elapsed time since `begin`, computed on every call.
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Trace id of the request currently being served on this task, if any.
pub fn current_trace_id() -> Option<String> {
    CURRENT.try_with(|ctx| ctx.trace_id.clone()).ok()
}

// Logs the end of the request scope on every exit path, including cancellation.
struct ScopeGuard {
    trace_id: String,
    started_at: Instant,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        tracing::debug!(
            trace_id = %self.trace_id,
            duration_ms = self.started_at.elapsed().as_millis() as u64,
            "correlation scope ended"
        );
    }
}

pub async fn correlation_middleware(mut req: Request<Body>, next: Next) -> Response {
    let inbound = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok());
    let ctx = CorrelationContext::begin(inbound);

    let _guard = ScopeGuard {
        trace_id: ctx.trace_id.clone(),
        started_at: ctx.started_at,
    };

    req.extensions_mut().insert(ctx.clone());
    let header = HeaderValue::from_str(ctx.trace_id()).ok();

    let mut res = CURRENT.scope(ctx, next.run(req)).await;

    if let Some(value) = header {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}
