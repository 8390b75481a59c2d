/*
 * Responsibility
 * - アプリ共通の AppError 定義 (エラー分類 → status / code / message)
 * - IntoResponse 実装: JSON は組み立てず、ApiFailure を response extensions に載せるだけ
 *   (envelope は middleware::envelope が唯一の描画点)
 * - extractor の rejection を BAD_REQUEST / PAYLOAD_TOO_LARGE に変換
 */
use axum::{
    Extension,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::middleware::correlation;

/// One rejected input field of a validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<serde_json::Value>,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        reason: impl Into<String>,
        rejected_value: Option<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
            rejected_value,
        }
    }
}

/// Normalized failure carried from `AppError::into_response` to the envelope stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub field_errors: Option<Vec<FieldError>>,
}

impl ApiFailure {
    /// Failure for a response that left the chain with an error status but no `AppError`
    /// (router 405, timeouts raised below the handler, etc).
    pub fn from_status(status: StatusCode) -> Self {
        let err = match status {
            StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE => AppError::BadRequest {
                message: "The request could not be read.".to_string(),
            },
            StatusCode::UNAUTHORIZED => AppError::AuthRequired,
            StatusCode::FORBIDDEN => AppError::AccessDenied,
            StatusCode::NOT_FOUND => AppError::RouteNotFound,
            StatusCode::METHOD_NOT_ALLOWED => AppError::MethodNotAllowed,
            StatusCode::REQUEST_TIMEOUT => AppError::RequestTimeout,
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
            StatusCode::CONFLICT => AppError::DataIntegrity(status.to_string()),
            s if s.is_client_error() => AppError::BadRequest {
                message: s.canonical_reason().unwrap_or("Bad Request").to_string(),
            },
            s => AppError::Internal(format!("response left the chain with status {s}")),
        };
        err.failure()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest { message: String },
    #[error("validation failed on {} field(s)", .field_errors.len())]
    Validation { field_errors: Vec<FieldError> },

    #[error("authentication failed")]
    AuthFailed,
    #[error("authentication required")]
    AuthRequired,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("access denied")]
    AccessDenied,

    #[error("route not found")]
    RouteNotFound,
    #[error("entity not found: {0}")]
    EntityNotFound(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("request timed out")]
    RequestTimeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn validation(field_errors: Vec<FieldError>) -> Self {
        Self::Validation { field_errors }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::AuthFailed => (StatusCode::UNAUTHORIZED, "AUTH_FAILED"),
            Self::AuthRequired => (StatusCode::UNAUTHORIZED, "AUTH_REQUIRED"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            Self::TokenInvalid => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID"),
            Self::AccessDenied => (StatusCode::FORBIDDEN, "ACCESS_DENIED"),
            Self::RouteNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::EntityNotFound(_) => (StatusCode::NOT_FOUND, "ENTITY_NOT_FOUND"),
            Self::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            Self::DataIntegrity(_) => (StatusCode::CONFLICT, "DATA_INTEGRITY"),
            Self::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::RequestTimeout => (StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    // Client-facing text. Never echoes internal detail or whether a username exists.
    fn client_message(&self) -> String {
        match self {
            Self::BadRequest { message } => message.clone(),
            Self::Validation { .. } => "Please check the input values.".into(),
            Self::AuthFailed => "Authentication failed.".into(),
            Self::AuthRequired => "Authentication is required.".into(),
            Self::TokenExpired => "The access token has expired.".into(),
            Self::TokenInvalid => "The access token is invalid.".into(),
            Self::AccessDenied => "You do not have permission to access this resource.".into(),
            Self::RouteNotFound => "The requested resource could not be found.".into(),
            Self::EntityNotFound(message) => message.clone(),
            Self::MethodNotAllowed => "The request method is not supported.".into(),
            Self::DataIntegrity(_) => "The request violates a data integrity constraint.".into(),
            Self::PayloadTooLarge => "The request body is too large.".into(),
            Self::RequestTimeout => "The request timed out.".into(),
            Self::Internal(_) => "An unexpected error occurred.".into(),
        }
    }

    pub fn failure(&self) -> ApiFailure {
        let (status, code) = self.status_and_code();
        let field_errors = match self {
            Self::Validation { field_errors } => Some(field_errors.clone()),
            _ => None,
        };
        ApiFailure {
            status,
            code,
            message: self.client_message(),
            field_errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let trace_id = correlation::current_trace_id().unwrap_or_default();

        match &self {
            Self::Internal(detail) => {
                tracing::error!(trace_id = %trace_id, detail = %detail, "unhandled error")
            }
            Self::DataIntegrity(detail) => {
                tracing::warn!(trace_id = %trace_id, detail = %detail, "data integrity violation")
            }
            Self::BadRequest { message } => {
                tracing::warn!(trace_id = %trace_id, message = %message, "bad request")
            }
            _ => tracing::debug!(trace_id = %trace_id, error = %self, "request failed"),
        }

        let failure = self.failure();
        (failure.status, Extension(failure)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_codes_agree_with_status() {
        let cases = [
            (AppError::bad_request("x"), 400, "BAD_REQUEST"),
            (AppError::validation(vec![]), 400, "VALIDATION_ERROR"),
            (AppError::AuthFailed, 401, "AUTH_FAILED"),
            (AppError::AccessDenied, 403, "ACCESS_DENIED"),
            (AppError::RouteNotFound, 404, "NOT_FOUND"),
            (AppError::EntityNotFound("gone".into()), 404, "ENTITY_NOT_FOUND"),
            (AppError::DataIntegrity("dup".into()), 409, "DATA_INTEGRITY"),
            (AppError::MethodNotAllowed, 405, "METHOD_NOT_ALLOWED"),
            (AppError::internal("boom"), 500, "INTERNAL_ERROR"),
        ];
        for (err, status, code) in cases {
            let (s, c) = err.status_and_code();
            assert_eq!(s.as_u16(), status);
            assert_eq!(c, code);
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let failure = AppError::internal("db password is hunter2").failure();
        assert!(!failure.message.contains("hunter2"));
        assert_eq!(failure.code, "INTERNAL_ERROR");
    }

    #[test]
    fn validation_failure_carries_field_errors() {
        let failure = AppError::validation(vec![FieldError::new(
            "username",
            "must not be blank",
            Some(serde_json::json!("")),
        )])
        .failure();
        let fields = failure.field_errors.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "username");
    }

    #[test]
    fn into_response_attaches_failure_without_body() {
        let res = AppError::AccessDenied.into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let failure = res.extensions().get::<ApiFailure>().unwrap();
        assert_eq!(failure.code, "ACCESS_DENIED");
    }

    #[test]
    fn bare_statuses_map_onto_the_taxonomy() {
        assert_eq!(
            ApiFailure::from_status(StatusCode::METHOD_NOT_ALLOWED).code,
            "METHOD_NOT_ALLOWED"
        );
        assert_eq!(
            ApiFailure::from_status(StatusCode::NOT_FOUND).code,
            "NOT_FOUND"
        );
        assert_eq!(
            ApiFailure::from_status(StatusCode::BAD_GATEWAY).code,
            "INTERNAL_ERROR"
        );
    }
}
