//! Caller-supplied handling of service failures

use std::collections::HashMap;

/// A `success: false` response as seen by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    pub path: String,
    pub message: String,
}

/// What a handler decided about a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The caller absorbed the failure; carries the notice shown to the user
    Handled(String),
    /// Not recognized; the gateway raises it as unhandled
    Unhandled,
}

pub trait FailureHandler: Send + Sync {
    fn dispose(&self, failure: &ServiceFailure) -> Disposition;
}

impl<F> FailureHandler for F
where
    F: Fn(&ServiceFailure) -> Disposition + Send + Sync,
{
    fn dispose(&self, failure: &ServiceFailure) -> Disposition {
        self(failure)
    }
}

/// Handles nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHandler;

impl FailureHandler for NoHandler {
    fn dispose(&self, _failure: &ServiceFailure) -> Disposition {
        Disposition::Unhandled
    }
}

/// Maps known service message codes to user-facing notices
#[derive(Debug, Clone, Default)]
pub struct KnownFailures {
    notices: HashMap<String, String>,
}

impl KnownFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, code: impl Into<String>, notice: impl Into<String>) -> Self {
        self.notices.insert(code.into(), notice.into());
        self
    }
}

impl FailureHandler for KnownFailures {
    fn dispose(&self, failure: &ServiceFailure) -> Disposition {
        match self.notices.get(&failure.message) {
            Some(notice) => Disposition::Handled(notice.clone()),
            None => Disposition::Unhandled,
        }
    }
}
