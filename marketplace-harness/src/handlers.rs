//! Service handlers of the mock backend
//!
//! Every handler answers HTTP 200 with the service envelope; failures are
//! reported through `{success: false, message}` like the real services do.

use std::cmp::Ordering;
use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::paths;
use crate::state::AppState;
use crate::types::*;

type Reply = Json<Value>;

/// Record the request, then decode its payload and bearer token
async fn accept<T: DeserializeOwned>(
    state: &AppState,
    path: &str,
    headers: &HeaderMap,
    body: Value,
) -> Result<(T, Option<String>), Reply> {
    let authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.record(path, authorization.clone(), body.clone()).await;

    let token = authorization.and_then(|v| v.strip_prefix("Bearer ").map(str::to_string));
    let request = serde_json::from_value(body).map_err(|e| {
        debug!(path, error = %e, "Rejecting payload");
        Json(failure("INVALID_PAYLOAD"))
    })?;
    Ok((request, token))
}

/// Customer behind the bearer token, or the `UNAUTHORIZED` reply
async fn authorize(state: &AppState, token: Option<String>) -> Result<String, Reply> {
    match token {
        Some(token) => state.user_for_token(&token).await.ok_or_else(|| Json(failure(UNAUTHORIZED))),
        None => Err(Json(failure(UNAUTHORIZED))),
    }
}

// ============================================================================
// Users Service
// ============================================================================

/// POST /users_service/sign_in_user_with_plain_account
pub async fn sign_in_with_plain_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let (request, _) = match accept::<PlainSignInRequest>(&state, paths::SIGN_IN_PLAIN, &headers, body).await {
        Ok(accepted) => accepted,
        Err(reply) => return reply,
    };

    let accounts = state.accounts.read().await;
    match accounts.iter().find(|a| a.email == request.email && a.password == request.password) {
        Some(account) => Json(success(json!({"token": account.token, "user_id": account.user_id}))),
        None => Json(failure(INCORRECT_CREDENTIALS)),
    }
}

/// POST /users_service/sign_in_user_with_google_account
pub async fn sign_in_with_google_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let (request, _) = match accept::<GoogleSignInRequest>(&state, paths::SIGN_IN_GOOGLE, &headers, body).await {
        Ok(accepted) => accepted,
        Err(reply) => return reply,
    };

    let accounts = state.accounts.read().await;
    let found = accounts
        .iter()
        .find(|a| a.google_unique_identifier.as_deref() == Some(request.google_unique_identifier.as_str()));
    match found {
        Some(account) => Json(success(json!({"token": account.token, "user_id": account.user_id}))),
        None => Json(failure(GOOGLE_ACCOUNT_NOT_FOUND)),
    }
}

// ============================================================================
// Posts Service
// ============================================================================

/// POST /posts_service/get_post_by_id
pub async fn get_post_by_id(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let (request, _) = match accept::<GetPostRequest>(&state, paths::GET_POST, &headers, body).await {
        Ok(accepted) => accepted,
        Err(reply) => return reply,
    };

    let posts = state.posts.read().await;
    match posts.iter().find(|p| p.post_id == request.post_id) {
        Some(post) => Json(success(post)),
        None => Json(failure(POST_NOT_FOUND)),
    }
}

/// POST /posts_service/search_posts_by_metadata
pub async fn search_posts_by_metadata(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let (request, _) = match accept::<SearchPostsRequest>(&state, paths::SEARCH_POSTS, &headers, body).await {
        Ok(accepted) => accepted,
        Err(reply) => return reply,
    };

    let text = request.searched_text.to_lowercase();
    let posts = state.posts.read().await;
    let mut matches: Vec<&Post> = posts
        .iter()
        .filter(|p| text.is_empty() || p.title.to_lowercase().contains(&text))
        .filter(|p| request.categories.is_empty() || p.categories.iter().any(|c| request.categories.contains(c)))
        .filter(|p| p.price >= request.minimum_price && p.price <= request.maximum_price)
        .collect();

    match request.sorting_property.as_str() {
        "price" => matches.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal)),
        "sent_datetime" => matches.sort_by(|a, b| a.publication_date.cmp(&b.publication_date)),
        _ => return Json(failure("INVALID_SORTING_PROPERTY")),
    }
    if request.sorting_schema != "ascending" {
        return Json(failure("INVALID_SORTING_SCHEMA"));
    }

    let summaries: Vec<PostSummary> = matches.into_iter().map(PostSummary::from).collect();
    Json(success(summaries))
}

/// POST /posts_service/get_maximum_price
pub async fn get_maximum_price(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(reply) = accept::<Value>(&state, paths::MAXIMUM_PRICE, &headers, body).await {
        return reply;
    }

    let posts = state.posts.read().await;
    let maximum = posts.iter().map(|p| p.price).fold(0.0_f64, f64::max);
    Json(success(maximum))
}

// ============================================================================
// Comments Service
// ============================================================================

/// POST /comments_service/get_post_comments
pub async fn get_post_comments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let (request, _) = match accept::<PostCommentsRequest>(&state, paths::POST_COMMENTS, &headers, body).await {
        Ok(accepted) => accepted,
        Err(reply) => return reply,
    };

    let comments = state.comments.read().await;
    let page: Vec<Comment> = comments
        .get(&request.post_id)
        .map(|all| all.iter().skip(request.start).take(request.amount).cloned().collect())
        .unwrap_or_default();
    Json(success(page))
}

/// POST /comments_service/add_comment
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let (request, token) = match accept::<AddCommentRequest>(&state, paths::ADD_COMMENT, &headers, body).await {
        Ok(accepted) => accepted,
        Err(reply) => return reply,
    };
    let user_id = match authorize(&state, token).await {
        Ok(user_id) => user_id,
        Err(reply) => return reply,
    };
    if user_id != request.customer_id {
        return Json(failure(UNAUTHORIZED));
    }

    let customer_name = state.customer_name(&user_id).await;
    let comment = Comment {
        comment_id: uuid::Uuid::new_v4().to_string(),
        customer_id: user_id,
        customer_name,
        text: request.text,
        date: "2022-11-05".to_string(),
    };
    state.comments.write().await.entry(request.post_id).or_default().insert(0, comment);
    Json(success(Value::Null))
}

// ============================================================================
// Stores, Sales and Chat Services
// ============================================================================

/// POST /stores_service/search_stores_by_name
pub async fn search_stores_by_name(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let (request, _) = match accept::<SearchStoresRequest>(&state, paths::SEARCH_STORES, &headers, body).await {
        Ok(accepted) => accepted,
        Err(reply) => return reply,
    };

    let search = request.search.to_lowercase();
    let stores = state.stores.read().await;
    let found: Vec<&Store> = stores.iter().filter(|s| s.name.to_lowercase().contains(&search)).collect();
    Json(success(found))
}

/// POST /sales_service/create_sale_intent
pub async fn create_sale_intent(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let (request, token) = match accept::<SaleIntentRequest>(&state, paths::CREATE_SALE_INTENT, &headers, body).await {
        Ok(accepted) => accepted,
        Err(reply) => return reply,
    };
    match authorize(&state, token).await {
        Ok(user_id) if user_id == request.customer_id => {}
        Ok(_) => return Json(failure(UNAUTHORIZED)),
        Err(reply) => return reply,
    }

    let posts = state.posts.read().await;
    let Some(post) = posts.iter().find(|p| p.post_id == request.post_id) else {
        return Json(failure(POST_NOT_FOUND));
    };
    if request.amount == 0 || request.amount > post.amount {
        return Json(failure(INVALID_AMOUNT));
    }

    let secret = format!("pi_{}_secret_{}", post.post_id, uuid::Uuid::new_v4().simple());
    Json(success(json!({"stripe_client_secret": secret})))
}

/// POST /chat_service/get_user_chats
pub async fn get_user_chats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let (request, token) = match accept::<UserChatsRequest>(&state, paths::USER_CHATS, &headers, body).await {
        Ok(accepted) => accepted,
        Err(reply) => return reply,
    };
    match authorize(&state, token).await {
        Ok(user_id) if user_id == request.user_id => {}
        Ok(_) => return Json(failure(UNAUTHORIZED)),
        Err(reply) => return reply,
    }

    let chats = state.chats.read().await;
    Json(success(chats.get(&request.user_id).cloned().unwrap_or_default()))
}
