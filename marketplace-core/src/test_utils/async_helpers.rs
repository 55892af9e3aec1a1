//! Async test helpers

use std::future::Future;

use tokio::sync::broadcast;
use tokio::time::{timeout, Duration};

/// Default timeout duration for tests (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Short timeout for tests that should fail fast (100ms)
pub const SHORT_TEST_TIMEOUT: Duration = Duration::from_millis(100);

/// Helper to assert a future completes within duration
pub async fn assert_completes_within<F, T>(duration: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => panic!("Future did not complete within {:?}", duration),
    }
}

/// Helper to assert a future does NOT complete within duration
pub async fn assert_times_out<F, T>(duration: Duration, future: F)
where
    F: Future<Output = T>,
{
    if timeout(duration, future).await.is_ok() {
        panic!("Expected future to timeout, but it completed within {:?}", duration);
    }
}

/// Drain every event already queued on a broadcast receiver
pub fn drain_events<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_assert_completes_within() {
        let value = assert_completes_within(SHORT_TEST_TIMEOUT, async { 5 }).await;
        assert_eq!(value, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_assert_times_out() {
        assert_times_out(SHORT_TEST_TIMEOUT, tokio::time::sleep(DEFAULT_TEST_TIMEOUT)).await;
    }

    #[test]
    fn test_drain_events() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        assert_eq!(drain_events(&mut rx), vec![1, 2]);
        assert!(drain_events(&mut rx).is_empty());
    }
}
