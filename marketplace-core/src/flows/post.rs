//! Post detail screen: the post, its paginated comments and the comment box

use tracing::debug;

use crate::api::{Comment, Post};
use crate::client::MarketplaceClient;
use crate::error::ClientError;
use crate::form::{not_empty, Form};
use crate::query::{InfiniteQuery, Mutation, MutationState, QueryKey, QuerySnapshot};

pub const POST_QUERY: &str = "post";
pub const COMMENT_FIELD: &str = "text";

pub fn post_key(post_id: &str) -> QueryKey {
    QueryKey::new(POST_QUERY).with(post_id)
}

/// Fetch a post through the cache, shared by every screen showing it
pub(crate) async fn fetch_post(
    client: &MarketplaceClient,
    post_id: &str,
) -> Result<QuerySnapshot<Post>, ClientError> {
    let api = client.api().clone();
    let id = post_id.to_string();
    let customer = client.session().customer_id();

    let snapshot = client
        .cache()
        .fetch(&post_key(post_id), move || {
            let api = api.clone();
            let id = id.clone();
            let customer = customer.clone();
            async move { api.get_post(&id, customer.as_deref()).await.map_err(ClientError::from) }
        })
        .await?;
    Ok(snapshot)
}

pub struct PostView {
    client: MarketplaceClient,
    post_id: String,
    comments: InfiniteQuery<Comment>,
    comment_form: Form,
    add_comment: Mutation<()>,
}

impl PostView {
    pub fn new(client: &MarketplaceClient, post_id: impl Into<String>) -> Self {
        let post_id = post_id.into();

        let api = client.api().clone();
        let id = post_id.clone();
        let comments = InfiniteQuery::new(
            format!("comments/{}", post_id),
            client.page_size(),
            client.cache().retry_policy().clone(),
            move |page| {
                let api = api.clone();
                let id = id.clone();
                async move {
                    api.get_post_comments(&id, page.start, page.amount)
                        .await
                        .map_err(ClientError::from)
                }
            },
        );

        let comment_form = Form::new().with_validator(COMMENT_FIELD, not_empty("Write a comment first"));

        Self {
            client: client.clone(),
            post_id,
            comments,
            comment_form,
            add_comment: Mutation::new(),
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub async fn post(&self) -> Result<QuerySnapshot<Post>, ClientError> {
        fetch_post(&self.client, &self.post_id).await
    }

    /// Reload the post even if it is cached
    pub async fn refresh_post(&self) -> Result<QuerySnapshot<Post>, ClientError> {
        self.client.cache().invalidate(&post_key(&self.post_id));
        self.post().await
    }

    /// Load the next page of comments (end of list reached)
    pub async fn load_more_comments(&mut self) -> Result<usize, ClientError> {
        self.comments.load_more().await
    }

    pub fn comments(&self) -> &[Comment] {
        self.comments.items()
    }

    pub fn comments_query(&self) -> &InfiniteQuery<Comment> {
        &self.comments
    }

    pub fn set_comment_text(&mut self, text: impl Into<String>) {
        self.comment_form.set_field(COMMENT_FIELD, text);
    }

    /// Whether the send button is enabled
    pub fn can_send_comment(&self) -> bool {
        !self.comment_form.has_errors() && !self.add_comment.is_running()
    }

    pub fn add_comment_state(&self) -> &MutationState<()> {
        self.add_comment.state()
    }

    /// Post the comment box, then reload the loaded comments
    pub async fn add_comment(&mut self) -> Result<(), ClientError> {
        let customer_id = self.client.require_customer()?;
        let text = self
            .comment_form
            .validate()?
            .get(COMMENT_FIELD)
            .cloned()
            .unwrap_or_default();

        let api = self.client.api().clone();
        let post_id = self.post_id.clone();
        self.add_comment
            .run(async move {
                api.add_comment(&post_id, &customer_id, &text).await.map_err(ClientError::from)
            })
            .await?;

        self.comment_form.set_field(COMMENT_FIELD, "");
        debug!(post_id = %self.post_id, "Comment added, reloading comments");
        self.comments.refresh().await
    }
}
