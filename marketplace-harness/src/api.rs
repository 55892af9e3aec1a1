//! API routes definition

use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers;
use crate::state::AppState;

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

/// Build the router with every service endpoint
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Users service
        .route(paths::SIGN_IN_PLAIN, post(handlers::sign_in_with_plain_account))
        .route(paths::SIGN_IN_GOOGLE, post(handlers::sign_in_with_google_account))
        // Posts service
        .route(paths::GET_POST, post(handlers::get_post_by_id))
        .route(paths::SEARCH_POSTS, post(handlers::search_posts_by_metadata))
        .route(paths::MAXIMUM_PRICE, post(handlers::get_maximum_price))
        // Comments service
        .route(paths::POST_COMMENTS, post(handlers::get_post_comments))
        .route(paths::ADD_COMMENT, post(handlers::add_comment))
        // Stores, sales and chat services
        .route(paths::SEARCH_STORES, post(handlers::search_stores_by_name))
        .route(paths::CREATE_SALE_INTENT, post(handlers::create_sale_intent))
        .route(paths::USER_CHATS, post(handlers::get_user_chats))
        .with_state(state)
}
