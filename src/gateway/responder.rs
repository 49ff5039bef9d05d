//! JSON error bodies.
//!
//! Every failure the front controller reports has the same shape:
//!
//! ```json
//! {
//!   "tod": "2026-10-16T09:12:44.120931+00:00",
//!   "success": false,
//!   "error": {
//!     "type": "HTTPException",
//!     "message": "no matching routes could be found",
//!     "http_name": "Not Found",
//!     "http_code": 404
//!   }
//! }
//! ```

use chrono::{Local, SecondsFormat};
use serde::Serialize;
use tracing::error;

use crate::http::{Response, StatusCode};
use crate::router::{BoxError, RouteError};

/// Error type reported for routing failures.
pub const HTTP_EXCEPTION: &str = "HTTPException";

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    tod: String,
    success: bool,
    error: ErrorDetail<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    message: &'a str,
    http_name: &'a str,
    http_code: u16,
}

/// Builds an error response with the standard JSON body.
pub fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    let body = ErrorBody {
        tod: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
        success: false,
        error: ErrorDetail {
            kind,
            message,
            http_name: status.canonical_reason(),
            http_code: status.as_u16(),
        },
    };
    match Response::json(status, &body) {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "failed to serialize error body");
            Response::new(status).body(message.to_owned())
        }
    }
}

/// Renders a routing failure. `405` responses carry an `Allow` header.
pub fn route_error(err: &RouteError) -> Response {
    let response = error_response(err.status(), HTTP_EXCEPTION, &err.to_string());
    match err {
        RouteError::MethodNotAllowed { allowed, .. } => {
            let allow = allowed
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            response.header("Allow", allow)
        }
        _ => response,
    }
}

/// Renders an error raised by a handler as a `500`.
///
/// The error is logged with its source chain; the client only sees its
/// top-level message.
pub fn handler_error(err: &BoxError) -> Response {
    let mut chain = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    error!(error = %err, causes = ?chain, "handler failed");

    error_response(
        StatusCode::InternalServerError,
        error_kind(err),
        &err.to_string(),
    )
}

/// Short name of the error's concrete type where it is one we know, else a
/// generic label.
fn error_kind(err: &BoxError) -> &'static str {
    if err.is::<std::io::Error>() {
        "IoError"
    } else if err.is::<serde_json::Error>() {
        "JsonError"
    } else if err.is::<RouteError>() {
        HTTP_EXCEPTION
    } else {
        "InternalError"
    }
}
