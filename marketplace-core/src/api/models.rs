//! Records exchanged with the marketplace services

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignInGrant {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Units in stock
    pub amount: u32,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Image URLs, first one is the cover
    #[serde(default)]
    pub multimedia: Vec<String>,
    pub store_name: String,
    pub publication_date: String,
}

/// A row of the search results list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub post_id: String,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub multimedia: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub text: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

/// The other participant of a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPeer {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub content_type: ContentType,
    pub content: String,
}

impl LastMessage {
    /// One-line preview shown under the chat title
    pub fn preview(&self) -> &str {
        match self.content_type {
            ContentType::Text => &self.content,
            ContentType::Image => "Image",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat_id: String,
    pub user: ChatPeer,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
}

impl ChatSummary {
    pub fn preview(&self) -> &str {
        self.last_message.as_ref().map(LastMessage::preview).unwrap_or("")
    }
}

/// Payment intent handed to the payment SDK
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaleIntent {
    pub stripe_client_secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortingProperty {
    #[default]
    Price,
    SentDatetime,
}

impl SortingProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortingProperty::Price => "price",
            SortingProperty::SentDatetime => "sent_datetime",
        }
    }
}

impl std::str::FromStr for SortingProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price" => Ok(SortingProperty::Price),
            "sent_datetime" | "date" => Ok(SortingProperty::SentDatetime),
            other => Err(format!("unknown sorting property '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortingSchema {
    #[default]
    Ascending,
}

impl SortingSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortingSchema::Ascending => "ascending",
        }
    }
}

/// Filters for the posts search
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostSearch {
    pub searched_text: String,
    pub categories: Vec<String>,
    pub sorting_property: SortingProperty,
    pub sorting_schema: SortingSchema,
    pub minimum_price: Decimal,
    /// Defaults to the catalogue's maximum price when unset
    pub maximum_price: Option<Decimal>,
}

impl PostSearch {
    pub fn text(searched_text: impl Into<String>) -> Self {
        Self { searched_text: searched_text.into(), ..Self::default() }
    }
}
