//! Mock marketplace backend speaking the service envelope protocol

pub mod api;
pub mod handlers;
pub mod server;
pub mod state;
pub mod types;

pub use server::{spawn_local, HarnessServer, RunningHarness};
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    async fn post(harness: &RunningHarness, path: &str, body: Value, token: Option<&str>) -> Value {
        let client = reqwest::Client::new();
        let mut request = client.post(format!("{}{}", harness.base_url(), path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap().json().await.unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_envelopes() {
        let harness = spawn_local().await.unwrap();

        let ok = post(
            &harness,
            api::paths::SIGN_IN_PLAIN,
            json!({"email": "ana@shop.co", "password": "hunter2"}),
            None,
        )
        .await;
        assert_eq!(ok, json!({"success": true, "data": {"token": "abc", "user_id": "u1"}}));

        let bad = post(
            &harness,
            api::paths::SIGN_IN_PLAIN,
            json!({"email": "ana@shop.co", "password": "nope"}),
            None,
        )
        .await;
        assert_eq!(bad, json!({"success": false, "message": "INCORRECT_CREDENTIALS"}));
    }

    #[tokio::test]
    async fn test_chats_require_token() {
        let harness = spawn_local().await.unwrap();

        let anonymous = post(&harness, api::paths::USER_CHATS, json!({"user_id": "u1"}), None).await;
        assert_eq!(anonymous["message"], "UNAUTHORIZED");

        let chats = post(&harness, api::paths::USER_CHATS, json!({"user_id": "u1"}), Some("abc")).await;
        assert_eq!(chats["success"], true);
        assert_eq!(chats["data"].as_array().unwrap().len(), 2);

        let recorded = harness.state().requests_to(api::paths::USER_CHATS).await;
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[1].authorization.as_deref(), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_comment_pages() {
        let harness = spawn_local().await.unwrap();
        let page = post(
            &harness,
            api::paths::POST_COMMENTS,
            json!({"post_id": "p1", "start": 40, "amount": 20}),
            None,
        )
        .await;
        assert_eq!(page["data"].as_array().unwrap().len(), 5);
    }
}
