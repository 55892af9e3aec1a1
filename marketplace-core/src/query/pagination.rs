//! Append-only paginated lists

use std::future::Future;

use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use super::{QueryStatus, RetryPolicy};
use crate::error::ClientError;

/// Page index of a paginated list; starts at 0 and only moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageCursor(u32);

impl PageCursor {
    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// First item of the current page
    pub fn offset(&self, page_size: u32) -> u32 {
        self.0.saturating_mul(page_size)
    }
}

/// Window requested from the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start: u32,
    pub amount: u32,
}

type PageFetcher<T> = Box<dyn Fn(PageRequest) -> BoxFuture<'static, Result<Vec<T>, ClientError>> + Send + Sync>;

/// A list that grows one page per "load more" signal
///
/// Items are only appended after a successful page; a failed page leaves
/// both the items and the cursor untouched so the same page is requested
/// again next time.
pub struct InfiniteQuery<T> {
    fetch: PageFetcher<T>,
    page_size: u32,
    cursor: PageCursor,
    items: Vec<T>,
    exhausted: bool,
    status: QueryStatus,
    error: Option<ClientError>,
    retry: RetryPolicy,
    label: String,
}

impl<T: Send + 'static> InfiniteQuery<T> {
    pub fn new<F, Fut>(label: impl Into<String>, page_size: u32, retry: RetryPolicy, fetch: F) -> Self
    where
        F: Fn(PageRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, ClientError>> + Send + 'static,
    {
        Self {
            fetch: Box::new(move |request| fetch(request).boxed()),
            page_size: page_size.max(1),
            cursor: PageCursor::default(),
            items: Vec::new(),
            exhausted: false,
            status: QueryStatus::Idle,
            error: None,
            retry,
            label: label.into(),
        }
    }

    /// Fetch the next page and append it; returns how many items were added
    ///
    /// Once a short page has been seen the list is exhausted and this returns
    /// `Ok(0)` without a request.
    pub async fn load_more(&mut self) -> Result<usize, ClientError> {
        if self.exhausted {
            return Ok(0);
        }

        let request = PageRequest { start: self.cursor.offset(self.page_size), amount: self.page_size };
        let page = self.request(request).await?;

        let added = page.len();
        self.exhausted = added < self.page_size as usize;
        self.items.extend(page);
        self.cursor.increment();
        debug!(
            query = %self.label,
            start = request.start,
            added,
            exhausted = self.exhausted,
            "Page loaded"
        );
        Ok(added)
    }

    /// Reload every loaded page in one request, replacing items on success
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        if self.cursor.value() == 0 {
            return self.load_more().await.map(|_| ());
        }

        let request = PageRequest { start: 0, amount: self.cursor.offset(self.page_size) };
        let items = self.request(request).await?;

        self.exhausted = items.len() < request.amount as usize;
        self.items = items;
        Ok(())
    }

    async fn request(&mut self, request: PageRequest) -> Result<Vec<T>, ClientError> {
        self.status = QueryStatus::Loading;
        let fetch = &self.fetch;
        let result = self.retry.run(&self.label, || fetch(request)).await;
        match result {
            Ok(items) => {
                self.status = QueryStatus::Success;
                self.error = None;
                Ok(items)
            }
            Err(e) => {
                self.status = QueryStatus::Error;
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn status(&self) -> QueryStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::NetworkError;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    /// Serves `total` numbered items and records every request
    fn numbered(total: u32, log: Arc<Mutex<Vec<PageRequest>>>) -> impl Fn(PageRequest) -> futures::future::Ready<Result<Vec<u32>, ClientError>> {
        move |request| {
            log.lock().unwrap().push(request);
            let end = (request.start + request.amount).min(total);
            futures::future::ready(Ok((request.start.min(end)..end).collect()))
        }
    }

    #[tokio::test]
    async fn test_load_more_offsets() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = InfiniteQuery::new("comments", 20, RetryPolicy::none(), numbered(1000, log.clone()));

        for _ in 0..3 {
            assert_eq!(list.load_more().await.unwrap(), 20);
        }

        let starts: Vec<_> = log.lock().unwrap().iter().map(|r| (r.start, r.amount)).collect();
        assert_eq!(starts, vec![(0, 20), (20, 20), (40, 20)]);
        assert_eq!(list.items().len(), 60);
        assert_eq!(list.items()[59], 59);
        assert_eq!(list.cursor().value(), 3);
    }

    #[tokio::test]
    async fn test_short_page_exhausts_list() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = InfiniteQuery::new("comments", 20, RetryPolicy::none(), numbered(25, log.clone()));

        assert_eq!(list.load_more().await.unwrap(), 20);
        assert_eq!(list.load_more().await.unwrap(), 5);
        assert!(list.is_exhausted());
        assert_eq!(list.load_more().await.unwrap(), 0);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_page_keeps_cursor_and_items() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = fail.clone();
        let mut list = InfiniteQuery::new("comments", 2, RetryPolicy::none(), move |request: PageRequest| {
            let fail = flag.load(std::sync::atomic::Ordering::SeqCst);
            async move {
                if fail {
                    Err(ClientError::Network(NetworkError::Timeout { path: "/c".into() }))
                } else {
                    Ok(vec![request.start, request.start + 1])
                }
            }
        });

        list.load_more().await.unwrap();
        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(list.load_more().await.is_err());
        assert_eq!(list.status(), QueryStatus::Error);
        assert_eq!(list.items(), &[0, 1]);
        assert_eq!(list.cursor().value(), 1);

        fail.store(false, std::sync::atomic::Ordering::SeqCst);
        list.load_more().await.unwrap();
        assert_eq!(list.items(), &[0, 1, 2, 3]);
        assert!(list.error().is_none());
    }

    #[tokio::test]
    async fn test_refresh_reloads_whole_window() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = InfiniteQuery::new("comments", 20, RetryPolicy::none(), numbered(1000, log.clone()));
        list.load_more().await.unwrap();
        list.load_more().await.unwrap();

        list.refresh().await.unwrap();
        assert_eq!(log.lock().unwrap().last().copied(), Some(PageRequest { start: 0, amount: 40 }));
        assert_eq!(list.items().len(), 40);
        assert_eq!(list.cursor().value(), 2);
    }

    proptest! {
        #[test]
        fn prop_offsets_are_cursor_times_page_size(loads in 1u32..12, page_size in 1u32..50) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let log = Arc::new(Mutex::new(Vec::new()));
            let mut list = InfiniteQuery::new("p", page_size, RetryPolicy::none(), numbered(u32::MAX / 2, log.clone()));

            runtime.block_on(async {
                for _ in 0..loads {
                    list.load_more().await.unwrap();
                }
            });

            let starts: Vec<u32> = log.lock().unwrap().iter().map(|r| r.start).collect();
            let expected: Vec<u32> = (0..loads).map(|n| n * page_size).collect();
            prop_assert_eq!(starts, expected);
        }
    }
}
