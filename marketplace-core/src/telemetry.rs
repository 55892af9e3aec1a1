//! Spans and counters for gateway calls and query fetches

use metrics::{counter, describe_counter};
use std::time::Instant;
use tracing::{span, Level, Span};

pub const GATEWAY_CALLS_TOTAL: &str = "gateway.calls.total";
pub const GATEWAY_CALLS_SUCCESS: &str = "gateway.calls.success";
pub const GATEWAY_CALLS_HANDLED: &str = "gateway.calls.handled";
pub const GATEWAY_CALLS_UNHANDLED: &str = "gateway.calls.unhandled";
pub const GATEWAY_CALLS_NETWORK: &str = "gateway.calls.network";
pub const QUERY_FETCHES_TOTAL: &str = "query.fetches.total";
pub const QUERY_RETRIES_TOTAL: &str = "query.retries.total";

/// Register descriptions for every counter this crate emits
pub fn describe_metrics() {
    describe_counter!(GATEWAY_CALLS_TOTAL, "Total service calls issued");
    describe_counter!(GATEWAY_CALLS_SUCCESS, "Service calls answered with success");
    describe_counter!(GATEWAY_CALLS_HANDLED, "Service failures absorbed by a caller handler");
    describe_counter!(GATEWAY_CALLS_UNHANDLED, "Service failures nobody handled");
    describe_counter!(GATEWAY_CALLS_NETWORK, "Calls that failed in transport");
    describe_counter!(QUERY_FETCHES_TOTAL, "Query fetch executions");
    describe_counter!(QUERY_RETRIES_TOTAL, "Query fetch retries after a retryable failure");
}

/// Increment a counter by one
pub fn bump(name: &'static str) {
    counter!(name).increment(1);
}

/// Trace context for one logical request
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub request_id: String,
}

impl TraceContext {
    pub fn new() -> Self {
        Self { request_id: uuid::Uuid::new_v4().to_string() }
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Traced operation wrapper
pub struct TracedOperation {
    span: Span,
    start: Instant,
}

impl TracedOperation {
    pub fn new(operation_name: &str) -> Self {
        let span = span!(Level::INFO, "operation", name = operation_name);
        Self { span, start: Instant::now() }
    }

    /// Start a traced operation tagged with a request id
    pub fn with_context(operation_name: &str, ctx: &TraceContext) -> Self {
        let span = span!(
            Level::INFO,
            "operation",
            name = operation_name,
            request_id = %ctx.request_id
        );
        Self { span, start: Instant::now() }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn record_event(&self, event: &str) {
        tracing::debug!(parent: &self.span, event = event);
    }

    pub fn record_error(&self, error: &str) {
        tracing::warn!(parent: &self.span, error = error);
    }

    /// Complete the operation and record duration
    pub fn complete(self) {
        let duration = self.start.elapsed();
        tracing::debug!(
            parent: &self.span,
            duration_ms = duration.as_millis() as u64,
            "operation completed"
        );
    }
}

/// Trace gateway calls
pub mod gateway {
    use super::*;

    pub fn trace_call(path: &str, ctx: &TraceContext) -> TracedOperation {
        let op = TracedOperation::with_context("gateway_call", ctx);
        tracing::debug!(parent: &op.span, path = path);
        op
    }
}

/// Trace query fetches
pub mod query {
    use super::*;

    pub fn trace_fetch(key: &str, generation: u64) -> TracedOperation {
        let op = TracedOperation::new("query_fetch");
        tracing::debug!(parent: &op.span, key = key, generation = generation);
        op
    }
}
