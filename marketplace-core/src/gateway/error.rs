//! Gateway error types

use thiserror::Error;

/// Transport-level failure, distinguishable by kind
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Request to {path} timed out")]
    Timeout { path: String },

    #[error("Backend unreachable for {path}: {reason}")]
    Unreachable { path: String, reason: String },

    #[error("Empty response from {path} (HTTP {status})")]
    EmptyResponse { path: String, status: u16 },

    #[error("Malformed response envelope from {path}: {reason}")]
    MalformedBody { path: String, reason: String },

    #[error("Response data from {path} has an unexpected shape: {reason}")]
    Decode { path: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(String),
}

/// A service failure absorbed by the caller's handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{notice}")]
pub struct HandledServiceError {
    pub path: String,
    /// The service's message code, e.g. `INCORRECT_CREDENTIALS`
    pub code: String,
    /// User-facing text chosen by the handler
    pub notice: String,
}

/// A service failure no handler claimed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Service call {path} failed: {message}")]
pub struct UnhandledServiceError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Handled(#[from] HandledServiceError),

    #[error(transparent)]
    Unhandled(#[from] UnhandledServiceError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl GatewayError {
    pub fn is_handled(&self) -> bool {
        matches!(self, GatewayError::Handled(_))
    }
}
