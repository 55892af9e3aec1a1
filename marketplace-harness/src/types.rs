//! Wire types of the mock backend

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `{success: true, data}`
pub fn success(data: impl Serialize) -> Value {
    json!({"success": true, "data": data})
}

/// `{success: false, message}`
pub fn failure(message: &str) -> Value {
    json!({"success": false, "message": message})
}

pub const INCORRECT_CREDENTIALS: &str = "INCORRECT_CREDENTIALS";
pub const GOOGLE_ACCOUNT_NOT_FOUND: &str = "GOOGLE_ACCOUNT_NOT_FOUND";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const POST_NOT_FOUND: &str = "POST_NOT_FOUND";
pub const INVALID_AMOUNT: &str = "INVALID_AMOUNT";

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub amount: u32,
    pub categories: Vec<String>,
    pub multimedia: Vec<String>,
    pub store_name: String,
    pub publication_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub post_id: String,
    pub title: String,
    pub price: f64,
    pub multimedia: Vec<String>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            post_id: post.post_id.clone(),
            title: post.title.clone(),
            price: post.price,
            multimedia: post.multimedia.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub text: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub user_id: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPeer {
    pub user_id: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMessage {
    pub content_type: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: String,
    pub user: ChatPeer,
    pub last_message: Option<LastMessage>,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PlainSignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleSignInRequest {
    pub google_unique_identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetPostRequest {
    pub post_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPostsRequest {
    #[serde(default)]
    pub searched_text: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub sorting_property: String,
    pub sorting_schema: String,
    pub minimum_price: f64,
    pub maximum_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostCommentsRequest {
    pub post_id: String,
    pub start: usize,
    pub amount: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCommentRequest {
    pub post_id: String,
    pub customer_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchStoresRequest {
    pub search: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleIntentRequest {
    pub post_id: String,
    pub customer_id: String,
    pub amount: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserChatsRequest {
    pub user_id: String,
}
