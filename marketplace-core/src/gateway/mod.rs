//! Request gateway: the only way the client talks to backend services
//!
//! Every call is a JSON payload posted to a logical path. The backend answers
//! with an envelope that is either `{success: true, data}` or
//! `{success: false, message}`. A failure is first offered to the caller's
//! [`FailureHandler`]; if it claims the failure the call ends with
//! [`GatewayError::Handled`], otherwise with [`GatewayError::Unhandled`].
//! Transport problems surface as [`GatewayError::Network`] and are never
//! turned into empty data. The gateway does not retry.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn, Instrument};

use crate::session::SessionStore;
use crate::telemetry::{self, TraceContext};

mod envelope;
mod error;
mod handler;
mod transport;

pub use envelope::ServiceResponse;
pub use error::{GatewayError, HandledServiceError, NetworkError, UnhandledServiceError};
pub use handler::{Disposition, FailureHandler, KnownFailures, NoHandler, ServiceFailure};
pub use transport::{HttpTransport, ServiceRequest, Transport};

pub struct RequestGateway {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
}

impl RequestGateway {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self { transport, session }
    }

    /// Call `path` with no failure handler
    pub async fn call(&self, path: &str, payload: Value) -> Result<Value, GatewayError> {
        self.call_handling(path, payload, &NoHandler).await
    }

    /// Call `path`, offering any service failure to `handler` first
    pub async fn call_handling(
        &self,
        path: &str,
        payload: Value,
        handler: &dyn FailureHandler,
    ) -> Result<Value, GatewayError> {
        let ctx = TraceContext::new();
        let op = telemetry::gateway::trace_call(path, &ctx);
        telemetry::bump(telemetry::GATEWAY_CALLS_TOTAL);

        let request = ServiceRequest {
            path: path.to_string(),
            payload,
            bearer_token: self.session.token(),
            request_id: ctx.request_id,
        };

        let result = self.exchange(&request, handler).instrument(op.span().clone()).await;

        match &result {
            Ok(_) => telemetry::bump(telemetry::GATEWAY_CALLS_SUCCESS),
            Err(e) => {
                telemetry::bump(match e {
                    GatewayError::Handled(_) => telemetry::GATEWAY_CALLS_HANDLED,
                    GatewayError::Unhandled(_) => telemetry::GATEWAY_CALLS_UNHANDLED,
                    GatewayError::Network(_) => telemetry::GATEWAY_CALLS_NETWORK,
                });
                op.record_error(&e.to_string());
            }
        }
        op.complete();
        result
    }

    /// Call `path` and deserialize `data` into `T`
    pub async fn call_typed<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: Value,
        handler: &dyn FailureHandler,
    ) -> Result<T, GatewayError> {
        let data = self.call_handling(path, payload, handler).await?;
        serde_json::from_value(data).map_err(|e| {
            NetworkError::Decode { path: path.to_string(), reason: e.to_string() }.into()
        })
    }

    async fn exchange(
        &self,
        request: &ServiceRequest,
        handler: &dyn FailureHandler,
    ) -> Result<Value, GatewayError> {
        let body = self.transport.send(request).await?;

        match ServiceResponse::from_slice(&request.path, &body)? {
            ServiceResponse::Success { data } => Ok(data),
            ServiceResponse::Failure { message } => {
                let failure = ServiceFailure { path: request.path.clone(), message };
                match handler.dispose(&failure) {
                    Disposition::Handled(notice) => {
                        debug!(path = %failure.path, code = %failure.message, "Service failure handled");
                        Err(HandledServiceError {
                            path: failure.path,
                            code: failure.message,
                            notice,
                        }
                        .into())
                    }
                    Disposition::Unhandled => {
                        warn!(path = %failure.path, message = %failure.message, "Unhandled service failure");
                        Err(UnhandledServiceError { path: failure.path, message: failure.message }
                            .into())
                    }
                }
            }
        }
    }
}
