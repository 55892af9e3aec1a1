//! Scripted in-memory transport

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::gateway::{NetworkError, ServiceRequest, Transport};

#[derive(Debug, Clone)]
pub enum MockReply {
    Success(Value),
    Failure(String),
    Network(NetworkError),
    Raw(Vec<u8>),
}

#[derive(Default)]
struct Script {
    queued: VecDeque<MockReply>,
    last: Option<MockReply>,
}

/// Replies are queued per path and served once each; when the queue for a
/// path runs dry its last served reply repeats
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<HashMap<String, Script>>>,
    requests: Arc<Mutex<Vec<ServiceRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: &str, reply: MockReply) {
        self.replies.lock().unwrap().entry(path.to_string()).or_default().queued.push_back(reply);
    }

    pub fn succeed(&self, path: &str, data: Value) {
        self.push(path, MockReply::Success(data));
    }

    pub fn fail(&self, path: &str, message: &str) {
        self.push(path, MockReply::Failure(message.to_string()));
    }

    pub fn fail_network(&self, path: &str, error: NetworkError) {
        self.push(path, MockReply::Network(error));
    }

    pub fn reply_raw(&self, path: &str, body: Vec<u8>) {
        self.push(path, MockReply::Raw(body));
    }

    /// Every request sent so far, oldest first
    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ServiceRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.path == path).count()
    }

    fn next_reply(&self, path: &str) -> Option<MockReply> {
        let mut replies = self.replies.lock().unwrap();
        let script = replies.get_mut(path)?;
        if let Some(reply) = script.queued.pop_front() {
            script.last = Some(reply);
        }
        script.last.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ServiceRequest) -> Result<Vec<u8>, NetworkError> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = self.next_reply(&request.path).unwrap_or_else(|| {
            MockReply::Network(NetworkError::Unreachable {
                path: request.path.clone(),
                reason: "no scripted reply".to_string(),
            })
        });

        match reply {
            MockReply::Success(data) => Ok(json!({"success": true, "data": data}).to_string().into_bytes()),
            MockReply::Failure(message) => {
                Ok(json!({"success": false, "message": message}).to_string().into_bytes())
            }
            MockReply::Network(error) => Err(error),
            MockReply::Raw(body) => Ok(body),
        }
    }
}

/// Shared invocation counter for fetch functions
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str) -> ServiceRequest {
        ServiceRequest {
            path: path.to_string(),
            payload: json!({}),
            bearer_token: None,
            request_id: "r".to_string(),
        }
    }

    #[tokio::test]
    async fn test_last_reply_is_sticky() {
        let transport = MockTransport::new();
        transport.fail("/a", "FIRST");
        transport.succeed("/a", json!(1));

        let first = transport.send(&request("/a")).await.unwrap();
        let second = transport.send(&request("/a")).await.unwrap();
        let third = transport.send(&request("/a")).await.unwrap();

        assert!(String::from_utf8(first).unwrap().contains("FIRST"));
        assert_eq!(second, third);
        assert_eq!(transport.call_count("/a"), 3);
    }

    #[tokio::test]
    async fn test_unscripted_path_is_unreachable() {
        let err = MockTransport::new().send(&request("/none")).await.unwrap_err();
        assert!(matches!(err, NetworkError::Unreachable { .. }));
    }
}
