//! Mount-time and request-time routing errors.

use thiserror::Error;

use super::types::VarType;
use crate::http::{Method, StatusCode};

/// Raised while mounting routes. Fatal: the service must not start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported rest-method: '{method}' (mounting '{template}')")]
    UnsupportedMethod { method: String, template: String },

    #[error("invalid route template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

/// Why a request could not be routed.
///
/// The `Display` text is the message sent to the client; the fields are for
/// logs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("no matching routes could be found")]
    NotFound { path: String },

    #[error("too many matched routes found")]
    AmbiguousRoute {
        path: String,
        /// Templates of every route that matched.
        candidates: Vec<String>,
    },

    #[error("HTTP method is not allowed on this route")]
    MethodNotAllowed {
        method: Method,
        template: String,
        allowed: Vec<Method>,
    },

    /// A segment matched its type's pattern but does not fit the native type.
    /// This is a defect in the type registry, not bad client input.
    #[error("path variable '{name}' could not be converted to {kind}")]
    Coercion {
        name: String,
        value: String,
        kind: VarType,
    },
}

impl RouteError {
    /// Status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NotFound,
            Self::AmbiguousRoute { .. } => StatusCode::MultipleChoices,
            Self::MethodNotAllowed { .. } => StatusCode::MethodNotAllowed,
            Self::Coercion { .. } => StatusCode::InternalServerError,
        }
    }
}
