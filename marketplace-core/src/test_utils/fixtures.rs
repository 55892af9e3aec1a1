//! Canned service records and client builders

use std::sync::Arc;

use serde_json::{json, Value};

use super::MockTransport;
use crate::client::MarketplaceClient;
use crate::config::ClientConfig;
use crate::query::RetryPolicy;
use crate::session::MemoryStorage;

pub fn post_json(post_id: &str, amount: u32) -> Value {
    json!({
        "post_id": post_id,
        "title": "Desk lamp",
        "description": "Warm light, barely used",
        "price": 19.99,
        "amount": amount,
        "categories": ["home", "lighting"],
        "multimedia": ["https://cdn.example/lamp.png"],
        "store_name": "Lights & Co",
        "publication_date": "2022-11-02"
    })
}

pub fn post_summary_json(post_id: &str, price: f64) -> Value {
    json!({"post_id": post_id, "title": format!("Post {}", post_id), "price": price, "multimedia": []})
}

/// `count` comments numbered from `start`
pub fn comments_json(start: u32, count: u32) -> Value {
    Value::Array(
        (start..start + count)
            .map(|n| {
                json!({
                    "comment_id": format!("c{}", n),
                    "customer_id": "u2",
                    "text": format!("comment {}", n),
                    "date": "2022-11-03"
                })
            })
            .collect(),
    )
}

pub fn chat_json(chat_id: &str, content_type: &str, content: &str) -> Value {
    json!({
        "chat_id": chat_id,
        "user": {"user_id": "u2", "name": "Ana", "picture": null},
        "last_message": {"content_type": content_type, "content": content}
    })
}

/// Config with retries disabled so failures surface immediately
pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.query.retry = RetryPolicy::none();
    config
}

/// Client over a scripted transport and in-memory storage
pub fn mock_client() -> (MarketplaceClient, MockTransport, MemoryStorage) {
    let transport = MockTransport::new();
    let storage = MemoryStorage::new();
    let client = MarketplaceClient::new(
        test_config(),
        Arc::new(transport.clone()),
        Arc::new(storage.clone()),
    );
    (client, transport, storage)
}
