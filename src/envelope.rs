//! Wire envelopes shared by every response body.
//!
//! Both shapes are null-omitting: optional fields are dropped rather than emitted as `null`,
//! while `status`/`success`/`code`/`message`/`path` are always present.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ApiFailure, FieldError};
use crate::middleware::correlation::CorrelationContext;

/// Response extension marking a body that has already been rendered as an envelope.
#[derive(Debug, Clone, Copy)]
pub struct Enveloped;

/// Request-side values stamped onto every envelope.
#[derive(Debug, Clone)]
pub struct EnvelopeMeta {
    pub path: String,
    pub trace_id: Option<String>,
    pub duration_ms: Option<u64>,
}

impl EnvelopeMeta {
    /// Snapshot taken when the envelope is built; the duration is computed here, not cached.
    pub fn capture(path: impl Into<String>, ctx: Option<&CorrelationContext>) -> Self {
        Self {
            path: path.into(),
            trace_id: ctx.map(|c| c.trace_id().to_string()),
            duration_ms: ctx.map(CorrelationContext::duration_ms),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessEnvelope {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub code: &'static str,
    pub message: &'static str,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl SuccessEnvelope {
    pub fn ok(data: Option<serde_json::Value>, meta: EnvelopeMeta) -> Self {
        Self {
            timestamp: Utc::now(),
            success: true,
            code: "OK",
            message: "success",
            path: meta.path,
            trace_id: meta.trace_id,
            duration_ms: meta.duration_ms,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: &'static str,
    pub success: bool,
    pub code: &'static str,
    pub message: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,
}

impl ErrorEnvelope {
    pub fn from_failure(failure: ApiFailure, meta: EnvelopeMeta) -> Self {
        Self {
            timestamp: Utc::now(),
            status: failure.status.as_u16(),
            error: failure.status.canonical_reason().unwrap_or("Unknown"),
            success: false,
            code: failure.code,
            message: failure.message,
            path: meta.path,
            trace_id: meta.trace_id,
            duration_ms: meta.duration_ms,
            field_errors: failure.field_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;

    fn meta() -> EnvelopeMeta {
        EnvelopeMeta {
            path: "/api/user/ping".into(),
            trace_id: None,
            duration_ms: None,
        }
    }

    #[test]
    fn success_envelope_omits_absent_fields() {
        let value = serde_json::to_value(SuccessEnvelope::ok(None, meta())).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["code"], json!("OK"));
        assert_eq!(value["message"], json!("success"));
        assert_eq!(value["path"], json!("/api/user/ping"));
        assert!(value.get("data").is_none());
        assert!(value.get("traceId").is_none());
        assert!(value.get("durationMs").is_none());
    }

    #[test]
    fn error_envelope_uses_reason_phrase() {
        let failure = ApiFailure {
            status: StatusCode::FORBIDDEN,
            code: "ACCESS_DENIED",
            message: "nope".into(),
            field_errors: None,
        };
        let mut m = meta();
        m.trace_id = Some("abc".into());
        m.duration_ms = Some(3);
        let value = serde_json::to_value(ErrorEnvelope::from_failure(failure, m)).unwrap();
        assert_eq!(value["status"], json!(403));
        assert_eq!(value["error"], json!("Forbidden"));
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["traceId"], json!("abc"));
        assert_eq!(value["durationMs"], json!(3));
        assert!(value.get("fieldErrors").is_none());
        assert!(value.get("data").is_none());
    }
}
