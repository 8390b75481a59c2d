/*
 * Responsibility
 * - 出口で 1 回だけレスポンス body を envelope に描画する
 *   - ApiFailure (AppError 由来) / 素の 4xx・5xx → ErrorEnvelope
 *   - JSON / text / 空 body の成功レスポンス → SuccessEnvelope
 * - status と header (Location, Allow など) は保持し、body だけ差し替える
 * - HTML / バイナリ / ストリーム / problem+json / 描画済み (Enveloped) は触らない
 */
use axum::{
    body::{Body, Bytes, HttpBody, to_bytes},
    http::{
        HeaderMap, HeaderValue, Request, StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        response::Parts,
    },
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use serde_json::Value;

use crate::envelope::{EnvelopeMeta, Enveloped, ErrorEnvelope, SuccessEnvelope};
use crate::error::{ApiFailure, AppError};
use crate::middleware::correlation::CorrelationContext;

const PROBLEM_JSON: &str = "application/problem+json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Empty,
    Json,
    Text,
    Passthrough,
}

pub async fn envelope_middleware(req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let ctx = req.extensions().get::<CorrelationContext>().cloned();

    let res = next.run(req).await;
    finish(res, path, ctx.as_ref()).await
}

async fn finish(res: Response, path: String, ctx: Option<&CorrelationContext>) -> Response {
    if res.extensions().get::<Enveloped>().is_some() {
        return res;
    }

    if let Some(failure) = res.extensions().get::<ApiFailure>().cloned() {
        return render_error(res, failure, EnvelopeMeta::capture(path, ctx));
    }

    let status = res.status();
    if status.is_client_error() || status.is_server_error() {
        if mime(res.headers()).as_deref() == Some(PROBLEM_JSON) {
            return res;
        }
        tracing::debug!(%status, path = %path, "normalizing bare error status");
        return render_error(
            res,
            ApiFailure::from_status(status),
            EnvelopeMeta::capture(path, ctx),
        );
    }

    wrap_success(res, EnvelopeMeta::capture(path, ctx)).await
}

fn render_error(res: Response, failure: ApiFailure, meta: EnvelopeMeta) -> Response {
    // Whatever body the failing layer produced is replaced.
    let (mut parts, _) = res.into_parts();
    parts.status = failure.status;
    parts.extensions.remove::<ApiFailure>();
    commit(parts, &ErrorEnvelope::from_failure(failure, meta))
}

async fn wrap_success(res: Response, meta: EnvelopeMeta) -> Response {
    let status = res.status();
    if status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
    {
        return res;
    }

    let empty = res.body().size_hint().exact() == Some(0);
    let kind = classify(res.headers(), empty);
    if kind == BodyKind::Passthrough {
        return res;
    }

    let (parts, body) = res.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let failure = AppError::internal(format!("failed to buffer response body: {err}"));
            let res = Response::from_parts(parts, Body::empty());
            return render_error(res, failure.failure(), meta);
        }
    };

    let data = match kind {
        BodyKind::Empty => None,
        BodyKind::Text => Some(Value::String(String::from_utf8_lossy(&bytes).into_owned())),
        BodyKind::Json if bytes.is_empty() => None,
        BodyKind::Json => match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(error = %err, path = %meta.path, "json body did not parse, passing through");
                return restore(parts, bytes);
            }
        },
        BodyKind::Passthrough => return restore(parts, bytes),
    };

    commit(parts, &SuccessEnvelope::ok(data, meta))
}

fn classify(headers: &HeaderMap, empty: bool) -> BodyKind {
    let Some(mime) = mime(headers) else {
        return if empty {
            BodyKind::Empty
        } else {
            BodyKind::Passthrough
        };
    };

    match mime.as_str() {
        PROBLEM_JSON => BodyKind::Passthrough,
        "application/json" => BodyKind::Json,
        m if m.starts_with("application/") && m.ends_with("+json") => BodyKind::Json,
        "text/plain" => BodyKind::Text,
        _ => BodyKind::Passthrough,
    }
}

// Media type without parameters, lowercased.
fn mime(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = raw.split(';').next().unwrap_or_default().trim();
    Some(essence.to_ascii_lowercase())
}

fn restore(parts: Parts, bytes: Bytes) -> Response {
    Response::from_parts(parts, Body::from(bytes))
}

fn commit<T: Serialize>(mut parts: Parts, envelope: &T) -> Response {
    let bytes = match serde_json::to_vec(envelope) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize envelope");
            parts.status = StatusCode::INTERNAL_SERVER_ERROR;
            br#"{"success":false,"code":"INTERNAL_ERROR","message":"An unexpected error occurred."}"#
                .to_vec()
        }
    };

    parts.headers.remove(CONTENT_LENGTH);
    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.extensions.insert(Enveloped);
    Response::from_parts(parts, Body::from(bytes))
}
