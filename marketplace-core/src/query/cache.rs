//! Keyed query cache
//!
//! Entries live behind a plain mutex that is never held across an `.await`.
//! A fetch runs as a shared future stored on its entry, so concurrent callers
//! for the same key join the execution already in flight. Each execution is
//! tagged with the entry's generation; a result whose generation no longer
//! matches (the entry was refetched or removed meanwhile) is dropped.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;
use tracing::debug;

use super::{QueryError, QueryEvent, QueryKey, QueryStatus, RetryPolicy};
use crate::error::ClientError;
use crate::telemetry;

type AnyData = Arc<dyn Any + Send + Sync>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<AnyData, ClientError>> + Send + Sync>;
type InFlight = Shared<BoxFuture<'static, ()>>;

const EVENT_CAPACITY: usize = 64;

#[derive(Default)]
struct Entry {
    status: QueryStatus,
    data: Option<AnyData>,
    error: Option<ClientError>,
    fetcher: Option<Fetcher>,
    generation: u64,
    stale: bool,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn needs_fetch(&self) -> bool {
        self.status == QueryStatus::Idle || self.stale
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    retry: RetryPolicy,
    events: broadcast::Sender<QueryEvent>,
}

impl Inner {
    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, key: &QueryKey, status: QueryStatus) {
        let _ = self.events.send(QueryEvent { key: key.clone(), status });
    }

    fn settle(&self, key: &QueryKey, generation: u64, result: Result<AnyData, ClientError>) {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(key) else {
            debug!(key = %key, "Ignoring response for removed query");
            return;
        };
        if entry.generation != generation {
            debug!(key = %key, generation, current = entry.generation, "Ignoring superseded response");
            return;
        }

        entry.in_flight = None;
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
                entry.status = QueryStatus::Success;
            }
            Err(e) => {
                debug!(key = %key, error = %e, stale_data = entry.data.is_some(), "Query failed");
                entry.error = Some(e);
                entry.status = QueryStatus::Error;
            }
        }
        self.emit(key, entry.status);
    }
}

/// What a query currently holds
#[derive(Debug)]
pub struct QuerySnapshot<T> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<ClientError>,
}

impl<T> Clone for QuerySnapshot<T> {
    fn clone(&self) -> Self {
        Self { status: self.status, data: self.data.clone(), error: self.error.clone() }
    }
}

impl<T> QuerySnapshot<T> {
    fn idle() -> Self {
        Self { status: QueryStatus::Idle, data: None, error: None }
    }

    /// No fetch has ever succeeded
    pub fn never_loaded(&self) -> bool {
        self.data.is_none()
    }

    /// The last fetch failed but earlier data is still there
    pub fn is_stale_but_usable(&self) -> bool {
        self.status == QueryStatus::Error && self.data.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    /// The data of a successful query, or the error that ended it
    pub fn into_result(self) -> Result<Arc<T>, ClientError> {
        match self.status {
            QueryStatus::Error => Err(self.error.unwrap_or(QueryError::NotLoaded.into())),
            _ => self.data.ok_or(QueryError::NotLoaded.into()),
        }
    }
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(retry: RetryPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner { entries: Mutex::new(HashMap::new()), retry, events }),
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    /// Fetch `key` unless it already holds fresh data
    ///
    /// `fetch` becomes the entry's fetch function for later refetches. A call
    /// made while the key is in flight waits for that execution instead of
    /// starting another one.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<QuerySnapshot<T>, QueryError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let fetcher: Fetcher = Arc::new(move || {
            let fut = fetch();
            async move { fut.await.map(|data| Arc::new(data) as AnyData) }.boxed()
        });

        {
            let mut entries = self.inner.entries();
            let entry = entries.entry(key.clone()).or_default();
            if entry.in_flight.is_none() {
                entry.fetcher = Some(fetcher);
                if entry.needs_fetch() {
                    self.start(key, entry);
                }
            }
        }

        self.settled(key).await;
        self.snapshot(key)
    }

    /// Fetch `key` as a continuation of the query `upstream`
    ///
    /// `fetch` receives the upstream data and is never invoked until the
    /// upstream query has succeeded at least once; until then the returned
    /// snapshot for `key` stays idle.
    pub async fn fetch_dependent<A, T, F, Fut>(
        &self,
        key: &QueryKey,
        upstream: &QueryKey,
        fetch: F,
    ) -> Result<QuerySnapshot<T>, QueryError>
    where
        A: Send + Sync + 'static,
        T: Send + Sync + 'static,
        F: Fn(Arc<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        match self.snapshot::<A>(upstream)?.data {
            Some(resolved) => self.fetch(key, move || fetch(resolved.clone())).await,
            None => {
                debug!(key = %key, upstream = %upstream, "Dependent query waiting on upstream");
                self.snapshot(key)
            }
        }
    }

    /// Force a new execution of `key` with its last fetch function
    ///
    /// Returns `None` when the key was never fetched. Previous data stays in
    /// place unless the new execution succeeds.
    pub async fn refetch(&self, key: &QueryKey) -> Option<QueryStatus> {
        {
            let mut entries = self.inner.entries();
            let entry = entries.get_mut(key).filter(|e| e.fetcher.is_some())?;
            self.start(key, entry);
        }

        self.settled(key).await;
        self.status(key)
    }

    /// Mark `key` stale so the next `fetch` executes again
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.inner.entries().get_mut(key) {
            entry.stale = true;
        }
    }

    /// Mark every key under `name` stale
    pub fn invalidate_prefix(&self, name: &str) {
        let prefix = format!("{}/", name);
        for (key, entry) in self.inner.entries().iter_mut() {
            if key.as_str() == name || key.as_str().starts_with(&prefix) {
                entry.stale = true;
            }
        }
    }

    /// Drop `key`; a response still in flight for it is ignored
    pub fn remove(&self, key: &QueryKey) {
        if self.inner.entries().remove(key).is_some() {
            self.inner.emit(key, QueryStatus::Idle);
        }
    }

    pub fn status(&self, key: &QueryKey) -> Option<QueryStatus> {
        self.inner.entries().get(key).map(|e| e.status)
    }

    /// Current state of `key` without fetching
    pub fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Result<QuerySnapshot<T>, QueryError> {
        let entries = self.inner.entries();
        let Some(entry) = entries.get(key) else {
            return Ok(QuerySnapshot::idle());
        };

        let data = match &entry.data {
            Some(any) => Some(
                any.clone()
                    .downcast::<T>()
                    .map_err(|_| QueryError::TypeMismatch { key: key.to_string() })?,
            ),
            None => None,
        };
        Ok(QuerySnapshot { status: entry.status, data, error: entry.error.clone() })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryEvent> {
        self.inner.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Begin a new generation for `entry`; the caller holds the entries lock
    fn start(&self, key: &QueryKey, entry: &mut Entry) {
        let Some(fetcher) = entry.fetcher.clone() else {
            return;
        };

        entry.generation += 1;
        entry.status = QueryStatus::Loading;
        entry.stale = false;
        let generation = entry.generation;

        let inner = self.inner.clone();
        let key_owned = key.clone();
        let task = async move {
            telemetry::bump(telemetry::QUERY_FETCHES_TOTAL);
            let op = telemetry::query::trace_fetch(key_owned.as_str(), generation);
            let result = inner.retry.run(key_owned.as_str(), || fetcher()).await;
            inner.settle(&key_owned, generation, result);
            op.complete();
        }
        .boxed()
        .shared();

        entry.in_flight = Some(task);
        self.inner.emit(key, QueryStatus::Loading);
    }

    /// Wait until `key` has no execution in flight
    async fn settled(&self, key: &QueryKey) {
        loop {
            let pending = self.inner.entries().get(key).and_then(|e| e.in_flight.clone());
            match pending {
                Some(task) => task.await,
                None => break,
            }
        }
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("retry", &self.inner.retry)
            .finish()
    }
}
