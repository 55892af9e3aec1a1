//! Typed marketplace endpoints
//!
//! One async function per remote operation. Paths are grouped by service
//! namespace; payload field names follow the wire protocol.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use crate::gateway::{GatewayError, KnownFailures, NoHandler, RequestGateway};

mod models;

pub use models::{
    ChatPeer, ChatSummary, Comment, ContentType, LastMessage, Post, PostSearch, PostSummary,
    SaleIntent, SignInGrant, SortingProperty, SortingSchema, StoreSummary,
};

pub mod paths {
    pub const SIGN_IN_PLAIN: &str = "/users_service/sign_in_user_with_plain_account";
    pub const SIGN_IN_GOOGLE: &str = "/users_service/sign_in_user_with_google_account";
    pub const GET_POST: &str = "/posts_service/get_post_by_id";
    pub const SEARCH_POSTS: &str = "/posts_service/search_posts_by_metadata";
    pub const MAXIMUM_PRICE: &str = "/posts_service/get_maximum_price";
    pub const POST_COMMENTS: &str = "/comments_service/get_post_comments";
    pub const ADD_COMMENT: &str = "/comments_service/add_comment";
    pub const SEARCH_STORES: &str = "/stores_service/search_stores_by_name";
    pub const CREATE_SALE_INTENT: &str = "/sales_service/create_sale_intent";
    pub const USER_CHATS: &str = "/chat_service/get_user_chats";
}

pub const INCORRECT_CREDENTIALS: &str = "INCORRECT_CREDENTIALS";
pub const GOOGLE_ACCOUNT_NOT_FOUND: &str = "GOOGLE_ACCOUNT_NOT_FOUND";
pub const INVALID_AMOUNT: &str = "INVALID_AMOUNT";

#[derive(Clone)]
pub struct MarketplaceApi {
    gateway: Arc<RequestGateway>,
}

impl MarketplaceApi {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<RequestGateway> {
        &self.gateway
    }

    /// Sign in with email and password; `INCORRECT_CREDENTIALS` is handled
    pub async fn sign_in_with_plain_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInGrant, GatewayError> {
        let handler = KnownFailures::new()
            .on(INCORRECT_CREDENTIALS, "The email or password you entered is incorrect");
        self.gateway
            .call_typed(paths::SIGN_IN_PLAIN, json!({"email": email, "password": password}), &handler)
            .await
    }

    /// Sign in with a Google account id; `GOOGLE_ACCOUNT_NOT_FOUND` is handled
    pub async fn sign_in_with_google_account(
        &self,
        google_unique_identifier: &str,
    ) -> Result<SignInGrant, GatewayError> {
        let handler = KnownFailures::new()
            .on(GOOGLE_ACCOUNT_NOT_FOUND, "No account is linked to this Google account");
        self.gateway
            .call_typed(
                paths::SIGN_IN_GOOGLE,
                json!({"google_unique_identifier": google_unique_identifier}),
                &handler,
            )
            .await
    }

    pub async fn get_post(&self, post_id: &str, customer_id: Option<&str>) -> Result<Post, GatewayError> {
        self.gateway
            .call_typed(
                paths::GET_POST,
                json!({"post_id": post_id, "customer_id": customer_id}),
                &NoHandler,
            )
            .await
    }

    /// Search posts; `maximum_price` falls back to `catalogue_maximum`
    pub async fn search_posts(
        &self,
        search: &PostSearch,
        catalogue_maximum: Decimal,
    ) -> Result<Vec<PostSummary>, GatewayError> {
        let maximum_price = search.maximum_price.unwrap_or(catalogue_maximum);
        let payload = json!({
            "searched_text": search.searched_text,
            "categories": search.categories,
            "sorting_property": search.sorting_property,
            "sorting_schema": search.sorting_schema,
            "minimum_price": decimal_to_json(search.minimum_price),
            "maximum_price": decimal_to_json(maximum_price),
        });
        self.gateway.call_typed(paths::SEARCH_POSTS, payload, &NoHandler).await
    }

    pub async fn get_maximum_price(&self) -> Result<Decimal, GatewayError> {
        self.gateway.call_typed(paths::MAXIMUM_PRICE, json!({}), &NoHandler).await
    }

    pub async fn get_post_comments(
        &self,
        post_id: &str,
        start: u32,
        amount: u32,
    ) -> Result<Vec<Comment>, GatewayError> {
        self.gateway
            .call_typed(
                paths::POST_COMMENTS,
                json!({"post_id": post_id, "start": start, "amount": amount}),
                &NoHandler,
            )
            .await
    }

    pub async fn add_comment(
        &self,
        post_id: &str,
        customer_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.gateway
            .call(
                paths::ADD_COMMENT,
                json!({"post_id": post_id, "customer_id": customer_id, "text": text}),
            )
            .await?;
        Ok(())
    }

    pub async fn search_stores(&self, search: &str) -> Result<Vec<StoreSummary>, GatewayError> {
        self.gateway
            .call_typed(paths::SEARCH_STORES, json!({"search": search}), &NoHandler)
            .await
    }

    /// Start a purchase; `INVALID_AMOUNT` (stock changed meanwhile) is handled
    pub async fn create_sale_intent(
        &self,
        post_id: &str,
        customer_id: &str,
        amount: u32,
    ) -> Result<SaleIntent, GatewayError> {
        let handler = KnownFailures::new()
            .on(INVALID_AMOUNT, "That many units are no longer available");
        self.gateway
            .call_typed(
                paths::CREATE_SALE_INTENT,
                json!({"post_id": post_id, "customer_id": customer_id, "amount": amount}),
                &handler,
            )
            .await
    }

    pub async fn get_user_chats(&self, user_id: &str) -> Result<Vec<ChatSummary>, GatewayError> {
        self.gateway
            .call_typed(paths::USER_CHATS, json!({"user_id": user_id}), &NoHandler)
            .await
    }
}

/// Prices travel as JSON numbers
fn decimal_to_json(value: Decimal) -> serde_json::Value {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().map(serde_json::Value::from).unwrap_or(serde_json::Value::Null)
}
