//! Buying a post: quantity selection and the payment intent

use tracing::info;

use super::post::fetch_post;
use crate::api::{Post, SaleIntent};
use crate::client::MarketplaceClient;
use crate::error::ClientError;
use crate::query::{Mutation, MutationState, QueryError, QuerySnapshot};

pub struct OrderForm {
    client: MarketplaceClient,
    post_id: String,
    quantity: u32,
    sale_intent: Mutation<SaleIntent>,
}

impl OrderForm {
    pub fn new(client: &MarketplaceClient, post_id: impl Into<String>) -> Self {
        Self {
            client: client.clone(),
            post_id: post_id.into(),
            quantity: 1,
            sale_intent: Mutation::new(),
        }
    }

    /// The post being bought
    pub async fn post(&self) -> Result<QuerySnapshot<Post>, ClientError> {
        fetch_post(&self.client, &self.post_id).await
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Choose how many units to buy, between 1 and the units in stock
    pub async fn set_quantity(&mut self, quantity: u32) -> Result<(), ClientError> {
        let post = self.post().await?.into_result()?;
        check_quantity(quantity, &post)?;
        self.quantity = quantity;
        Ok(())
    }

    pub fn state(&self) -> &MutationState<SaleIntent> {
        self.sale_intent.state()
    }

    /// Create the sale intent; its client secret goes to the payment SDK
    pub async fn submit(&mut self) -> Result<SaleIntent, ClientError> {
        let customer_id = self.client.require_customer()?;
        let post = self
            .client
            .cache()
            .snapshot::<Post>(&super::post::post_key(&self.post_id))?
            .data
            .ok_or(ClientError::Query(QueryError::NotLoaded))?;
        check_quantity(self.quantity, &post)?;

        let api = self.client.api().clone();
        let post_id = self.post_id.clone();
        let quantity = self.quantity;
        let intent = self
            .sale_intent
            .run(async move {
                api.create_sale_intent(&post_id, &customer_id, quantity)
                    .await
                    .map_err(ClientError::from)
            })
            .await?;

        info!(post_id = %self.post_id, quantity, "Sale intent created");
        Ok(intent)
    }
}

fn check_quantity(quantity: u32, post: &Post) -> Result<(), ClientError> {
    if (1..=post.amount).contains(&quantity) {
        Ok(())
    } else {
        Err(ClientError::InvalidInput(format!(
            "quantity must be between 1 and {}",
            post.amount
        )))
    }
}
