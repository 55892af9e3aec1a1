//! Query caching, dependency gating, pagination and mutations
//!
//! A query is identified by a [`QueryKey`] and runs its fetch function at
//! most once per key until it is invalidated or explicitly refetched. Data is
//! only ever replaced by a successful fetch, so a failed refetch leaves the
//! previous data visible next to the error.

use std::fmt;

use thiserror::Error;

mod cache;
mod mutation;
mod pagination;
mod retry;

pub use cache::{QueryCache, QuerySnapshot};
pub use mutation::{Mutation, MutationState};
pub use pagination::{InfiniteQuery, PageCursor, PageRequest};
pub use retry::RetryPolicy;

/// Cache key: a query name plus the parameters that select the entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Append one parameter
    pub fn with(mut self, param: impl fmt::Display) -> Self {
        self.0.push('/');
        self.0.push_str(&param.to_string());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Status change of one query, broadcast to the rendering layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEvent {
    pub key: QueryKey,
    pub status: QueryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Query {key} holds data of a different type")]
    TypeMismatch { key: String },

    #[error("Query has not loaded yet")]
    NotLoaded,
}
