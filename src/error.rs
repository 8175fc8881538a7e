//! Service error taxonomy and its HTTP mapping.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::observability::metrics;

/// Errors surfaced to callers of the hashing and stats endpoints.
///
/// None of these are retried by the server. Caller errors map to a
/// not-found class response; a disabled component maps to 503.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Empty or malformed input.
    #[error("malformed request: {0}")]
    Validation(String),

    /// Unknown identifier, or a result that is not computed yet.
    #[error("failed hash lookup: {0}")]
    NotFound(String),

    /// The component has been disabled by shutdown.
    #[error("service unavailable: shutdown in progress")]
    Unavailable,

    /// Wrong HTTP verb for the endpoint.
    #[error("unsupported request type: {0}")]
    UnsupportedMethod(Method),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// The HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Validation(_)
            | ServiceError::NotFound(_)
            | ServiceError::UnsupportedMethod(_) => StatusCode::NOT_FOUND,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Unavailable => "unavailable",
            ServiceError::UnsupportedMethod(_) => "unsupported_method",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ServiceError::Unavailable => tracing::debug!(error = %self, "Request rejected"),
            _ => tracing::warn!(error = %self, "Request failed"),
        }
        metrics::record_rejection(self.reason());

        let body = match status {
            StatusCode::NOT_FOUND => "404 page not found\n",
            _ => "",
        };
        (status, body).into_response()
    }
}
