//! Sign-in, sign-out and boot routing

use tracing::info;

use crate::client::MarketplaceClient;
use crate::error::ClientError;
use crate::form::{all_of, email, not_empty, Form};
use crate::query::{Mutation, MutationState};
use crate::session::{InitialRoute, Session};

use super::chats::CHATS_QUERY;
use super::post::POST_QUERY;

pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_FIELD: &str = "password";

/// Restore the persisted session and pick the first screen
pub async fn boot(client: &MarketplaceClient) -> Result<InitialRoute, ClientError> {
    Ok(client.session().initial_route().await?)
}

/// Clear the session and drop per-customer cached data
pub async fn sign_out(client: &MarketplaceClient) -> Result<(), ClientError> {
    client.session().clear().await?;
    forget_customer_queries(client);
    info!("Signed out");
    Ok(())
}

/// Mark stale every query whose result depends on who is signed in
fn forget_customer_queries(client: &MarketplaceClient) {
    client.cache().invalidate_prefix(CHATS_QUERY);
    client.cache().invalidate_prefix(POST_QUERY);
}

/// Sign-in screen state
pub struct SignIn {
    client: MarketplaceClient,
    form: Form,
    mutation: Mutation<Session>,
}

impl SignIn {
    pub fn new(client: &MarketplaceClient) -> Self {
        let form = Form::new()
            .with_validator(
                EMAIL_FIELD,
                all_of(vec![
                    not_empty("Enter your email"),
                    email("Enter a valid email address"),
                ]),
            )
            .with_validator(PASSWORD_FIELD, not_empty("Enter your password"));

        Self { client: client.clone(), form, mutation: Mutation::new() }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.form.set_field(EMAIL_FIELD, value);
    }

    pub fn set_password(&mut self, value: impl Into<String>) {
        self.form.set_field(PASSWORD_FIELD, value);
    }

    pub fn state(&self) -> &MutationState<Session> {
        self.mutation.state()
    }

    /// Validate the form, then sign in with email and password
    ///
    /// Invalid input never reaches the network. `INCORRECT_CREDENTIALS` comes
    /// back as [`ClientError::Handled`] and leaves the session untouched.
    pub async fn submit(&mut self) -> Result<Session, ClientError> {
        let fields = self.form.validate()?;
        let email = fields.get(EMAIL_FIELD).cloned().unwrap_or_default();
        let password = fields.get(PASSWORD_FIELD).cloned().unwrap_or_default();

        let client = self.client.clone();
        self.mutation
            .run(async move {
                let grant = client.api().sign_in_with_plain_account(email.trim(), &password).await?;
                establish(&client, grant.token, grant.user_id).await
            })
            .await
    }

    /// Sign in with the identifier returned by the Google sign-in SDK
    pub async fn submit_google(&mut self, google_unique_identifier: &str) -> Result<Session, ClientError> {
        let client = self.client.clone();
        let id = google_unique_identifier.to_string();
        self.mutation
            .run(async move {
                let grant = client.api().sign_in_with_google_account(&id).await?;
                establish(&client, grant.token, grant.user_id).await
            })
            .await
    }
}

async fn establish(
    client: &MarketplaceClient,
    token: String,
    user_id: String,
) -> Result<Session, ClientError> {
    let session = Session::new(token, user_id)?;
    client.session().set(session.clone()).await?;
    forget_customer_queries(client);
    info!(customer_id = %session.customer_id(), "Signed in");
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{paths, INCORRECT_CREDENTIALS};
    use crate::session::{DurableStorage, SESSION_ENTRY};
    use crate::flows::post::fetch_post;
    use crate::test_utils::{mock_client, post_json};
    use serde_json::json;

    #[tokio::test]
    async fn test_invalid_form_blocks_network_call() {
        let (client, transport, _) = mock_client();
        let mut sign_in = SignIn::new(&client);
        sign_in.set_email("not-an-email");

        let err = sign_in.submit().await.unwrap_err();
        match err {
            ClientError::Validation(e) => {
                assert_eq!(e.message_for(EMAIL_FIELD), Some("Enter a valid email address"));
                assert_eq!(e.message_for(PASSWORD_FIELD), Some("Enter your password"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_incorrect_credentials_is_handled() {
        let (client, transport, storage) = mock_client();
        transport.fail(paths::SIGN_IN_PLAIN, INCORRECT_CREDENTIALS);

        let mut sign_in = SignIn::new(&client);
        sign_in.set_email("ana@shop.co");
        sign_in.set_password("wrong");

        let err = sign_in.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::Handled(_)));
        assert!(!err.surfaces_to_fallback());
        assert!(matches!(sign_in.state(), MutationState::Handled(_)));
        assert_eq!(client.session().current(), None);
        assert_eq!(storage.get_item(SESSION_ENTRY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_success_stores_session() {
        let (client, transport, storage) = mock_client();
        transport.succeed(paths::SIGN_IN_PLAIN, json!({"token": "abc", "user_id": "u1"}));

        let mut sign_in = SignIn::new(&client);
        sign_in.set_email("ana@shop.co");
        sign_in.set_password("hunter2");
        let session = sign_in.submit().await.unwrap();

        assert_eq!(session.token(), "abc");
        assert_eq!(session.customer_id(), "u1");
        assert_eq!(
            transport.requests()[0].payload,
            json!({"email": "ana@shop.co", "password": "hunter2"})
        );
        let stored = storage.get_item(SESSION_ENTRY).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(&stored).unwrap(), json!({"token": "abc", "customerId": "u1"}));
    }

    #[tokio::test]
    async fn test_session_changes_refetch_posts_for_the_customer() {
        let (client, transport, _) = mock_client();
        transport.succeed(paths::GET_POST, post_json("42", 3));
        transport.succeed(paths::SIGN_IN_PLAIN, json!({"token": "abc", "user_id": "u1"}));

        fetch_post(&client, "42").await.unwrap();

        let mut sign_in = SignIn::new(&client);
        sign_in.set_email("ana@shop.co");
        sign_in.set_password("hunter2");
        sign_in.submit().await.unwrap();
        fetch_post(&client, "42").await.unwrap();

        sign_out(&client).await.unwrap();
        fetch_post(&client, "42").await.unwrap();

        let customers: Vec<_> = transport
            .requests_to(paths::GET_POST)
            .iter()
            .map(|r| r.payload["customer_id"].clone())
            .collect();
        assert_eq!(customers, vec![json!(null), json!("u1"), json!(null)]);
    }

    #[tokio::test]
    async fn test_boot_and_sign_out() {
        let (client, transport, _) = mock_client();
        assert_eq!(boot(&client).await.unwrap(), InitialRoute::Anonymous);

        transport.succeed(paths::SIGN_IN_GOOGLE, json!({"token": "abc", "user_id": "u1"}));
        SignIn::new(&client).submit_google("g-1").await.unwrap();
        assert!(matches!(boot(&client).await.unwrap(), InitialRoute::Authenticated(_)));

        sign_out(&client).await.unwrap();
        sign_out(&client).await.unwrap();
        assert_eq!(boot(&client).await.unwrap(), InitialRoute::Anonymous);
    }
}
