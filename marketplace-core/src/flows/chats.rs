//! Chats list of the signed-in customer

use crate::api::ChatSummary;
use crate::client::MarketplaceClient;
use crate::error::ClientError;
use crate::query::{QueryKey, QuerySnapshot};

pub const CHATS_QUERY: &str = "chats";

/// One row of the chats list, carrying what the chat screen is opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRow {
    pub chat_id: String,
    pub receiver_id: String,
    pub receiver_name: String,
    pub receiver_picture: Option<String>,
    pub preview: String,
}

impl From<&ChatSummary> for ChatRow {
    fn from(chat: &ChatSummary) -> Self {
        Self {
            chat_id: chat.chat_id.clone(),
            receiver_id: chat.user.user_id.clone(),
            receiver_name: chat.user.name.clone(),
            receiver_picture: chat.user.picture.clone(),
            preview: chat.preview().to_string(),
        }
    }
}

pub struct ChatsList {
    client: MarketplaceClient,
}

impl ChatsList {
    pub fn new(client: &MarketplaceClient) -> Self {
        Self { client: client.clone() }
    }

    /// Chats of the current customer; anonymous users get `SessionRequired`
    pub async fn chats(&self) -> Result<QuerySnapshot<Vec<ChatSummary>>, ClientError> {
        let customer_id = self.client.require_customer()?;
        let api = self.client.api().clone();
        let key = QueryKey::new(CHATS_QUERY).with(&customer_id);

        let snapshot = self
            .client
            .cache()
            .fetch(&key, move || {
                let api = api.clone();
                let customer_id = customer_id.clone();
                async move { api.get_user_chats(&customer_id).await.map_err(ClientError::from) }
            })
            .await?;
        Ok(snapshot)
    }

    pub async fn rows(&self) -> Result<Vec<ChatRow>, ClientError> {
        let chats = self.chats().await?.into_result()?;
        Ok(chats.iter().map(ChatRow::from).collect())
    }

    /// Pull to refresh
    pub async fn refresh(&self) -> Result<Vec<ChatRow>, ClientError> {
        let customer_id = self.client.require_customer()?;
        self.client.cache().invalidate(&QueryKey::new(CHATS_QUERY).with(customer_id));
        self.rows().await
    }
}
