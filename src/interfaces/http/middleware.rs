//! Process-wide error interception
//!
//! Handlers map their own failures to [`ApiError`]; everything that escapes —
//! in Rust, a panic mid-handler — is caught at the outermost layer by
//! `CatchPanicLayer` and converted to the same uniform envelope, so every
//! response carries `{statusCode, message}` without per-handler boilerplate.

use std::any::Any;

use axum::response::{IntoResponse, Response};

use super::common::ApiError;

/// Convert a caught panic into the 500 envelope. Wire with
/// `CatchPanicLayer::custom(handle_panic)` as the outermost layer.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!("request handler panicked: {}", detail);

    ApiError::internal().into_response()
}

/// Router fallback so unknown paths also return the uniform envelope.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}
