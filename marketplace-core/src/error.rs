//! Client-level error taxonomy

use thiserror::Error;

use crate::form::ValidationError;
use crate::gateway::{GatewayError, HandledServiceError, NetworkError, UnhandledServiceError};
use crate::query::QueryError;
use crate::session::SessionError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Form input rejected before any network call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Service failure the caller absorbed; carries the user-facing notice
    #[error(transparent)]
    Handled(#[from] HandledServiceError),

    #[error(transparent)]
    Unhandled(#[from] UnhandledServiceError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("This action requires signing in")]
    SessionRequired,

    /// Input outside what the operation accepts, e.g. an order quantity
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<GatewayError> for ClientError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Handled(e) => ClientError::Handled(e),
            GatewayError::Unhandled(e) => ClientError::Unhandled(e),
            GatewayError::Network(e) => ClientError::Network(e),
        }
    }
}

impl ClientError {
    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Validation(_) => "validation",
            ClientError::Handled(_) => "handled",
            ClientError::Unhandled(_) => "unhandled",
            ClientError::Network(_) => "network",
            ClientError::Session(_) => "session",
            ClientError::Query(_) => "query",
            ClientError::SessionRequired => "session_required",
            ClientError::InvalidInput(_) => "invalid_input",
        }
    }

    /// Whether a query may retry after this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Unhandled(_) | ClientError::Network(_))
    }

    /// Whether this error belongs to the generic error boundary rather than the screen
    pub fn surfaces_to_fallback(&self) -> bool {
        matches!(self, ClientError::Unhandled(_) | ClientError::Network(_))
    }

    /// The notice to show inline, for errors a screen handles itself
    pub fn notice(&self) -> Option<String> {
        match self {
            ClientError::Handled(e) => Some(e.notice.clone()),
            ClientError::Validation(e) => Some(e.to_string()),
            ClientError::InvalidInput(msg) => Some(msg.clone()),
            ClientError::SessionRequired => Some(self.to_string()),
            _ => None,
        }
    }
}
