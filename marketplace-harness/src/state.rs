//! In-memory marketplace served by the harness
//!
//! Seeded with a fixed catalogue so tests can rely on ids, tokens and
//! prices. Every request is recorded for inspection.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::types::{Chat, ChatPeer, Comment, LastMessage, Post, Store};

/// A registered customer
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub google_unique_identifier: Option<String>,
    /// Token issued on every sign-in
    pub token: String,
}

/// One request as the harness received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Server state shared across requests
#[derive(Clone, Default)]
pub struct AppState {
    pub accounts: Arc<RwLock<Vec<Account>>>,
    pub posts: Arc<RwLock<Vec<Post>>>,
    pub comments: Arc<RwLock<HashMap<String, Vec<Comment>>>>,
    pub stores: Arc<RwLock<Vec<Store>>>,
    pub chats: Arc<RwLock<HashMap<String, Vec<Chat>>>>,
    pub requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl AppState {
    /// Empty marketplace
    pub fn new() -> Self {
        Self::default()
    }

    /// Marketplace with two customers, three posts, 45 comments on post `p1`, stores and chats
    pub fn seeded() -> Self {
        let accounts = vec![
            Account {
                user_id: "u1".to_string(),
                name: "Ana".to_string(),
                email: "ana@shop.co".to_string(),
                password: "hunter2".to_string(),
                google_unique_identifier: Some("google-ana".to_string()),
                token: "abc".to_string(),
            },
            Account {
                user_id: "u2".to_string(),
                name: "Luis".to_string(),
                email: "luis@shop.co".to_string(),
                password: "secret".to_string(),
                google_unique_identifier: None,
                token: "def".to_string(),
            },
        ];

        let posts = vec![
            post("p1", "Desk lamp", 19.99, 3, &["home", "lighting"], "Lights & Co", "2022-11-02"),
            post("p2", "Floor lamp", 89.5, 1, &["home", "lighting"], "Lights & Co", "2022-10-28"),
            post("p3", "Mountain bike", 640.0, 2, &["sports"], "Bikes Store", "2022-11-04"),
        ];

        let comments = (0..45)
            .map(|n| Comment {
                comment_id: format!("c{}", n),
                customer_id: "u2".to_string(),
                customer_name: Some("Luis".to_string()),
                text: format!("Question {}", n),
                date: "2022-11-03".to_string(),
            })
            .collect();

        let stores = vec![
            Store { user_id: "s1".to_string(), name: "Lights & Co".to_string(), picture: None },
            Store { user_id: "s2".to_string(), name: "Bikes Store".to_string(), picture: None },
        ];

        let chats = vec![
            Chat {
                chat_id: "chat1".to_string(),
                user: ChatPeer { user_id: "u2".to_string(), name: "Luis".to_string(), picture: None },
                last_message: Some(LastMessage {
                    content_type: "text".to_string(),
                    content: "Is the lamp still available?".to_string(),
                }),
            },
            Chat {
                chat_id: "chat2".to_string(),
                user: ChatPeer { user_id: "s2".to_string(), name: "Bikes Store".to_string(), picture: None },
                last_message: Some(LastMessage {
                    content_type: "image".to_string(),
                    content: "https://cdn.example/bike.png".to_string(),
                }),
            },
        ];

        Self {
            accounts: Arc::new(RwLock::new(accounts)),
            posts: Arc::new(RwLock::new(posts)),
            comments: Arc::new(RwLock::new(HashMap::from([("p1".to_string(), comments)]))),
            stores: Arc::new(RwLock::new(stores)),
            chats: Arc::new(RwLock::new(HashMap::from([("u1".to_string(), chats)]))),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn record(&self, path: &str, authorization: Option<String>, body: Value) {
        self.requests.write().await.push(RecordedRequest {
            path: path.to_string(),
            authorization,
            body,
        });
    }

    /// Requests received on `path`, oldest first
    pub async fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests.read().await.iter().filter(|r| r.path == path).cloned().collect()
    }

    /// The customer a bearer token belongs to
    pub async fn user_for_token(&self, token: &str) -> Option<String> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.token == token)
            .map(|a| a.user_id.clone())
    }

    pub async fn customer_name(&self, user_id: &str) -> Option<String> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.user_id == user_id)
            .map(|a| a.name.clone())
    }
}

fn post(
    post_id: &str,
    title: &str,
    price: f64,
    amount: u32,
    categories: &[&str],
    store_name: &str,
    publication_date: &str,
) -> Post {
    Post {
        post_id: post_id.to_string(),
        title: title.to_string(),
        description: format!("{} in good condition", title),
        price,
        amount,
        categories: categories.iter().map(|c| c.to_string()).collect(),
        multimedia: vec![format!("https://cdn.example/{}.png", post_id)],
        store_name: store_name.to_string(),
        publication_date: publication_date.to_string(),
    }
}
