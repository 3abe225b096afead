//! Gateway error taxonomy.
//!
//! Every variant is caught at the inbound-request boundary and turned into a
//! fixed caller-facing response. Only the logs see the detailed message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::envelope::PayloadVersion;

/// Errors raised while routing or invoking a function.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No path binding (and no wildcard) matches the inbound path.
    #[error("Path: {path} doesn't match any functions. Check the configured path mappings")]
    Routing { path: String },

    /// A resolved function name has no configured endpoint.
    #[error("function {function} not found")]
    FunctionNotFound { function: String },

    /// The function returned something the payload version cannot turn into a response.
    #[error(
        "Invalid response format from function \"{endpoint}\" ({function}). {} See {} for more details.",
        .version.format_expectation(),
        .version.response_schema_url()
    )]
    Format {
        function: String,
        endpoint: String,
        version: PayloadVersion,
    },

    /// The call to the function endpoint itself failed.
    #[error("invocation of function {function} failed: {reason}")]
    Downstream { function: String, reason: String },
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn downstream(function: &str, reason: impl ToString) -> Self {
        GatewayError::Downstream {
            function: function.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Caller-facing status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Routing { .. } => StatusCode::NOT_FOUND,
            GatewayError::FunctionNotFound { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Format { .. } | GatewayError::Downstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Routing { .. } => "routing",
            GatewayError::FunctionNotFound { .. } => "function_not_found",
            GatewayError::Format { .. } => "format",
            GatewayError::Downstream { .. } => "downstream",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, kind = self.kind(), "Gateway error");
        let status = self.status_code();
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}
