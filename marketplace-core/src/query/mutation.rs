//! One-shot operations (sign-in, add comment, create sale intent)

use std::future::Future;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState<T> {
    #[default]
    Idle,
    Running,
    Succeeded(T),
    /// The service failure was absorbed; carries the notice to show
    Handled(String),
    Failed(ClientError),
}

/// State of a single user-triggered operation; mutations are never retried
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    state: MutationState<T>,
}

impl<T: Clone> Mutation<T> {
    pub fn new() -> Self {
        Self { state: MutationState::Idle }
    }

    /// Run `operation`, tracking its state
    pub async fn run<Fut>(&mut self, operation: Fut) -> Result<T, ClientError>
    where
        Fut: Future<Output = Result<T, ClientError>>,
    {
        self.state = MutationState::Running;
        let result = operation.await;
        self.state = match &result {
            Ok(value) => MutationState::Succeeded(value.clone()),
            Err(ClientError::Handled(e)) => MutationState::Handled(e.notice.clone()),
            Err(e) => MutationState::Failed(e.clone()),
        };
        result
    }

    pub fn state(&self) -> &MutationState<T> {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, MutationState::Running)
    }

    pub fn reset(&mut self) {
        self.state = MutationState::Idle;
    }
}

impl<T: Clone> Default for Mutation<T> {
    fn default() -> Self {
        Self::new()
    }
}
