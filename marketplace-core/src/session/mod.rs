//! Reactive, persisted authentication session
//!
//! [`SessionStore`] is a single-writer, many-reader cell. Mutations
//! (`initialize`, `set`, `clear`) are serialized behind one async mutex and
//! applied to durable storage before the in-memory value is swapped, so every
//! reader observes either the value before or after a mutation.
//!
//! Readers never take the writer lock: they borrow the current value from a
//! `tokio::sync::watch` channel, and subscribers hold a receiver whose
//! lifetime bounds the subscription.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

mod storage;

pub use storage::{DurableStorage, FileStorage, MemoryStorage};

/// Name of the durable entry holding the session
pub const SESSION_ENTRY: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session is incomplete: {0} is missing")]
    Incomplete(&'static str),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Failed to encode session: {0}")]
    Encode(String),

    #[error("Session store was dropped")]
    StoreClosed,
}

impl SessionError {
    pub(crate) fn storage(path: &Path, err: std::io::Error) -> Self {
        SessionError::Storage(format!("{}: {}", path.display(), err))
    }
}

/// Authenticated identity: bearer token plus the customer it belongs to
///
/// Both fields are always present; there is no way to build a session with
/// only one of them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredSession", rename_all = "camelCase")]
pub struct Session {
    token: String,
    customer_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    token: Option<String>,
    customer_id: Option<String>,
}

impl TryFrom<StoredSession> for Session {
    type Error = SessionError;

    fn try_from(stored: StoredSession) -> Result<Self, Self::Error> {
        Session::new(
            stored.token.unwrap_or_default(),
            stored.customer_id.unwrap_or_default(),
        )
    }
}

impl Session {
    /// Build a session, rejecting blank fields
    pub fn new(token: impl Into<String>, customer_id: impl Into<String>) -> Result<Self, SessionError> {
        let session = Self { token: token.into(), customer_id: customer_id.into() };
        session.ensure_complete()?;
        Ok(session)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    fn ensure_complete(&self) -> Result<(), SessionError> {
        if self.token.trim().is_empty() {
            return Err(SessionError::Incomplete("token"));
        }
        if self.customer_id.trim().is_empty() {
            return Err(SessionError::Incomplete("customerId"));
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("customer_id", &self.customer_id)
            .finish()
    }
}

/// Where the app boots, decided once from the restored session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialRoute {
    /// A session was restored; boot into the signed-in flow
    Authenticated(Session),
    /// No session; boot into the welcome / sign-in flow
    Anonymous,
}

impl From<Option<Session>> for InitialRoute {
    fn from(session: Option<Session>) -> Self {
        match session {
            Some(session) => InitialRoute::Authenticated(session),
            None => InitialRoute::Anonymous,
        }
    }
}

/// Single-writer, many-reader session cell
pub struct SessionStore {
    storage: Arc<dyn DurableStorage>,
    current: watch::Sender<Option<Session>>,
    writer: Mutex<()>,
}

impl SessionStore {
    /// Create an empty store over `storage`; call [`initialize`](Self::initialize) before use
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        let (current, _) = watch::channel(None);
        Self { storage, current, writer: Mutex::new(()) }
    }

    /// Restore the durable session once at startup
    ///
    /// A corrupt or incomplete entry is treated as absent and removed.
    pub async fn initialize(&self) -> Result<Option<Session>, SessionError> {
        let _guard = self.writer.lock().await;

        let restored = match self.with_storage(|s| s.get_item(SESSION_ENTRY)).await? {
            None => None,
            Some(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable session entry");
                    self.with_storage(|s| s.remove_item(SESSION_ENTRY)).await?;
                    None
                }
            },
        };

        info!(authenticated = restored.is_some(), "Session restored");
        self.current.send_replace(restored.clone());
        Ok(restored)
    }

    /// Restore the session and decide the boot route
    pub async fn initial_route(&self) -> Result<InitialRoute, SessionError> {
        Ok(self.initialize().await?.into())
    }

    /// Persist and publish a new session
    ///
    /// Subscribers can already observe `session` when this returns.
    pub async fn set(&self, session: Session) -> Result<(), SessionError> {
        let _guard = self.writer.lock().await;

        session.ensure_complete()?;
        let entry =
            serde_json::to_string(&session).map_err(|e| SessionError::Encode(e.to_string()))?;
        self.with_storage(move |s| s.set_item(SESSION_ENTRY, &entry)).await?;

        debug!(customer_id = %session.customer_id(), "Session stored");
        self.current.send_replace(Some(session));
        Ok(())
    }

    /// Remove the durable session and reset to anonymous; a no-op when already empty
    pub async fn clear(&self) -> Result<(), SessionError> {
        let _guard = self.writer.lock().await;

        self.with_storage(|s| s.remove_item(SESSION_ENTRY)).await?;
        let changed = self.current.send_if_modified(|current| current.take().is_some());
        if changed {
            debug!("Session cleared");
        }
        Ok(())
    }

    /// Run a storage operation on the blocking pool
    async fn with_storage<T, F>(&self, op: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DurableStorage) -> Result<T, SessionError> + Send + 'static,
    {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || op(storage.as_ref()))
            .await
            .map_err(|e| SessionError::Storage(format!("storage task failed: {}", e)))?
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    /// Bearer token of the current session, if any
    pub fn token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.token.clone())
    }

    /// Customer id of the current session, if any
    pub fn customer_id(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.customer_id.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Subscribe to session changes; dropping the handle unsubscribes
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription { rx: self.current.subscribe() }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.current.receiver_count()
    }
}

/// A consumer's view of the session, alive as long as the handle is
pub struct SessionSubscription {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionSubscription {
    /// Latest published value, marking it seen
    pub fn current(&mut self) -> Option<Session> {
        self.rx.borrow_and_update().clone()
    }

    /// Whether a value was published since the last [`current`](Self::current) / [`changed`](Self::changed)
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next published value
    pub async fn changed(&mut self) -> Result<Option<Session>, SessionError> {
        self.rx.changed().await.map_err(|_| SessionError::StoreClosed)?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_over(storage: &MemoryStorage) -> SessionStore {
        SessionStore::new(Arc::new(storage.clone()))
    }

    /// Records which threads touch storage
    #[derive(Default)]
    struct ThreadRecordingStorage {
        inner: MemoryStorage,
        threads: std::sync::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl ThreadRecordingStorage {
        fn record(&self) {
            self.threads.lock().unwrap().push(std::thread::current().id());
        }
    }

    impl DurableStorage for ThreadRecordingStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
            self.record();
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
            self.record();
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<(), SessionError> {
            self.record();
            self.inner.remove_item(key)
        }
    }

    #[tokio::test]
    async fn test_storage_runs_off_the_runtime_thread() {
        let storage = Arc::new(ThreadRecordingStorage::default());
        let store = SessionStore::new(storage.clone());

        store.initialize().await.unwrap();
        store.set(Session::new("abc", "u1").unwrap()).await.unwrap();
        store.clear().await.unwrap();

        let runtime_thread = std::thread::current().id();
        let threads = storage.threads.lock().unwrap();
        assert_eq!(threads.len(), 3);
        assert!(threads.iter().all(|id| *id != runtime_thread));
        assert_eq!(storage.inner.get_item(SESSION_ENTRY).unwrap(), None);
    }

    #[test]
    fn test_session_requires_both_fields() {
        assert_eq!(Session::new("", "u1").unwrap_err(), SessionError::Incomplete("token"));
        assert_eq!(Session::new("abc", " ").unwrap_err(), SessionError::Incomplete("customerId"));
        assert!(Session::new("abc", "u1").is_ok());
    }

    #[test]
    fn test_session_wire_format() {
        let session = Session::new("abc", "u1").unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json, serde_json::json!({"token": "abc", "customerId": "u1"}));

        let partial = serde_json::from_str::<Session>(r#"{"token":"abc"}"#);
        assert!(partial.is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("secret-token", "u1").unwrap();
        let printed = format!("{:?}", session);
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("u1"));
    }

    #[tokio::test]
    async fn test_set_persists_and_restart_restores() {
        let storage = MemoryStorage::new();
        let store = store_over(&storage);
        assert_eq!(store.initialize().await.unwrap(), None);

        let session = Session::new("abc", "u1").unwrap();
        store.set(session.clone()).await.unwrap();

        let raw = storage.get_item(SESSION_ENTRY).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Session>(&raw).unwrap(), session);

        let restarted = store_over(&storage);
        assert_eq!(restarted.current(), None);
        assert_eq!(restarted.initialize().await.unwrap(), Some(session.clone()));
        assert_eq!(restarted.current(), Some(session));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let storage = MemoryStorage::new();
        let store = store_over(&storage);
        store.initialize().await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.current(), None);

        store.set(Session::new("abc", "u1").unwrap()).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.current(), None);
        assert_eq!(storage.get_item(SESSION_ENTRY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_subscribers_observe_set_before_it_resolves() {
        let store = store_over(&MemoryStorage::new());
        let mut first = store.subscribe();
        let mut second = store.subscribe();
        assert_eq!(store.subscriber_count(), 2);

        let session = Session::new("abc", "u1").unwrap();
        store.set(session.clone()).await.unwrap();

        assert!(first.has_changed());
        assert!(second.has_changed());
        assert_eq!(first.current(), Some(session.clone()));
        assert_eq!(second.current(), Some(session));
        assert!(!first.has_changed());
    }

    #[tokio::test]
    async fn test_dropping_subscription_unsubscribes() {
        let store = store_over(&MemoryStorage::new());
        let subscription = store.subscribe();
        assert_eq!(store.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_on_empty_store_does_not_notify() {
        let store = store_over(&MemoryStorage::new());
        let subscription = store.subscribe();
        store.clear().await.unwrap();
        assert!(!subscription.has_changed());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_discarded() {
        let storage = MemoryStorage::new();
        storage.set_item(SESSION_ENTRY, r#"{"token":"abc"}"#).unwrap();

        let store = store_over(&storage);
        assert_eq!(store.initial_route().await.unwrap(), InitialRoute::Anonymous);
        assert_eq!(storage.get_item(SESSION_ENTRY).unwrap(), None);

        storage.set_item(SESSION_ENTRY, "not json").unwrap();
        assert_eq!(store.initialize().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_serialized_writers_last_call_wins() {
        let store = Arc::new(store_over(&MemoryStorage::new()));
        let session = Session::new("abc", "u1").unwrap();

        let setter = {
            let store = store.clone();
            let session = session.clone();
            tokio::spawn(async move { store.set(session).await })
        };
        setter.await.unwrap().unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.current(), None);
        assert_eq!(store.token(), None);
    }

    #[tokio::test]
    async fn test_changed_wakes_waiting_subscriber() {
        let store = Arc::new(store_over(&MemoryStorage::new()));
        let mut subscription = store.subscribe();

        let waiter = tokio::spawn(async move { subscription.changed().await });
        tokio::task::yield_now().await;

        store.set(Session::new("abc", "u1").unwrap()).await.unwrap();
        let observed = waiter.await.unwrap().unwrap();
        assert_eq!(observed.unwrap().token(), "abc");
    }
}
