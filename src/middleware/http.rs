//! HTTP-level middleware (cross-cutting concerns).
//!
//! Responsibility:
//! - Access logging / request tracing (TraceLayer), tagged with the request's trace id
//! - Body size limits
//! - Global timeouts
//! - Converting handler panics into an `INTERNAL_ERROR` response
//!
//! Every failure produced here is an `AppError`, so the envelope stage renders it like
//! any other error.

use std::any::Any;

use axum::Router;
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::HttpSettings;
use crate::error::AppError;
use crate::middleware::correlation::CorrelationContext;

/// Timeout, panic and body-size guards, applied inside the envelope stage.
pub fn apply_guards(router: Router, settings: &HttpSettings) -> Router {
    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                AppError::RequestTimeout
            } else {
                AppError::internal(format!("unhandled middleware error: {err}"))
            }
        }))
        .layer(TimeoutLayer::new(settings.timeout))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(RequestBodyLimitLayer::new(settings.body_limit_bytes));

    router.layer(layers)
}

/// Access log for all requests. The span carries the trace id set by the correlation stage.
pub fn apply_trace(router: Router) -> Router {
    router.layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        let trace_id = req
            .extensions()
            .get::<CorrelationContext>()
            .map(|c| c.trace_id().to_string())
            .unwrap_or_default();
        tracing::info_span!(
            "request",
            method = %req.method(),
            uri = %req.uri(),
            trace_id = %trace_id,
        )
    }))
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "non-string panic payload".to_string()
    };

    AppError::internal(format!("handler panicked: {detail}")).into_response()
}
