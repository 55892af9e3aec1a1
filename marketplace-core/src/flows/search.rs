//! Search results: matching stores plus posts filtered by price and sorted
//!
//! The posts search needs the catalogue's maximum price as its default upper
//! bound, so it runs as a continuation of the maximum-price query and is
//! never sent before that query has succeeded.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::api::{PostSearch, PostSummary, StoreSummary};
use crate::client::MarketplaceClient;
use crate::error::ClientError;
use crate::query::{QueryKey, QuerySnapshot};

pub const STORES_QUERY: &str = "stores";
pub const MAXIMUM_PRICE_QUERY: &str = "maximum_price";
pub const POSTS_QUERY: &str = "posts";

pub struct SearchResults {
    client: MarketplaceClient,
    search: PostSearch,
}

impl SearchResults {
    pub fn new(client: &MarketplaceClient, search: PostSearch) -> Self {
        Self { client: client.clone(), search }
    }

    pub fn filters(&self) -> &PostSearch {
        &self.search
    }

    fn stores_key(&self) -> QueryKey {
        QueryKey::new(STORES_QUERY).with(&self.search.searched_text)
    }

    fn maximum_price_key() -> QueryKey {
        QueryKey::new(MAXIMUM_PRICE_QUERY)
    }

    /// Every filter is part of the key, so each combination caches separately
    fn posts_key(&self) -> QueryKey {
        let search = &self.search;
        let maximum = search.maximum_price.map(|m| m.to_string()).unwrap_or_else(|| "*".to_string());
        QueryKey::new(POSTS_QUERY)
            .with(&search.searched_text)
            .with(search.categories.join(","))
            .with(search.sorting_property.as_str())
            .with(search.sorting_schema.as_str())
            .with(search.minimum_price)
            .with(maximum)
    }

    pub async fn stores(&self) -> Result<QuerySnapshot<Vec<StoreSummary>>, ClientError> {
        let api = self.client.api().clone();
        let text = self.search.searched_text.clone();
        let snapshot = self
            .client
            .cache()
            .fetch(&self.stores_key(), move || {
                let api = api.clone();
                let text = text.clone();
                async move { api.search_stores(&text).await.map_err(ClientError::from) }
            })
            .await?;
        Ok(snapshot)
    }

    /// Upper limit of the price filter
    pub async fn maximum_price(&self) -> Result<QuerySnapshot<Decimal>, ClientError> {
        let api = self.client.api().clone();
        let snapshot = self
            .client
            .cache()
            .fetch(&Self::maximum_price_key(), move || {
                let api = api.clone();
                async move { api.get_maximum_price().await.map_err(ClientError::from) }
            })
            .await?;
        Ok(snapshot)
    }

    /// Posts matching the current filters
    ///
    /// Idle until the maximum price has loaded; call [`maximum_price`](Self::maximum_price) first.
    pub async fn posts(&self) -> Result<QuerySnapshot<Vec<PostSummary>>, ClientError> {
        let api = self.client.api().clone();
        let search = self.search.clone();
        let posts_fetch = move |limit: Arc<Decimal>| {
            let api = api.clone();
            let search = search.clone();
            async move { api.search_posts(&search, *limit).await.map_err(ClientError::from) }
        };
        let snapshot = self
            .client
            .cache()
            .fetch_dependent(&self.posts_key(), &Self::maximum_price_key(), posts_fetch)
            .await?;
        Ok(snapshot)
    }

    /// Load the maximum price, then the posts that depend on it
    pub async fn load(&self) -> Result<QuerySnapshot<Vec<PostSummary>>, ClientError> {
        let limit = self.maximum_price().await?;
        if let (true, Some(err)) = (limit.never_loaded(), limit.error) {
            return Err(err);
        }
        self.posts().await
    }

    /// Replace the filters and search posts again
    pub async fn apply_filters(&mut self, search: PostSearch) -> Result<QuerySnapshot<Vec<PostSummary>>, ClientError> {
        if let Some(maximum) = search.maximum_price {
            if search.minimum_price > maximum {
                return Err(ClientError::InvalidInput(format!(
                    "minimum price {} is above maximum price {}",
                    search.minimum_price, maximum
                )));
            }
        }
        if search.minimum_price < Decimal::ZERO {
            return Err(ClientError::InvalidInput("minimum price cannot be negative".to_string()));
        }

        self.search = search;
        self.client.cache().invalidate(&self.posts_key());
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{paths, SortingProperty};
    use crate::gateway::NetworkError;
    use crate::query::QueryStatus;
    use crate::test_utils::{mock_client, post_summary_json};
    use serde_json::json;

    #[tokio::test]
    async fn test_posts_wait_for_maximum_price() {
        let (client, transport, _) = mock_client();
        transport.fail_network(
            paths::MAXIMUM_PRICE,
            NetworkError::Timeout { path: paths::MAXIMUM_PRICE.to_string() },
        );
        transport.succeed(paths::SEARCH_POSTS, json!([]));

        let results = SearchResults::new(&client, PostSearch::text("lamp"));
        let posts = results.posts().await.unwrap();
        assert_eq!(posts.status, QueryStatus::Idle);

        assert!(results.load().await.is_err());
        assert_eq!(transport.call_count(paths::SEARCH_POSTS), 0);
    }

    #[tokio::test]
    async fn test_posts_use_maximum_price_as_default_bound() {
        let (client, transport, _) = mock_client();
        transport.succeed(paths::MAXIMUM_PRICE, json!(900));
        transport.succeed(paths::SEARCH_POSTS, json!([post_summary_json("1", 10.0)]));

        let results = SearchResults::new(&client, PostSearch::text("lamp"));
        let posts = results.load().await.unwrap();
        assert_eq!(posts.data.unwrap().len(), 1);

        let payload = &transport.requests_to(paths::SEARCH_POSTS)[0].payload;
        assert_eq!(payload["maximum_price"], json!(900.0));
        assert_eq!(payload["minimum_price"], json!(0.0));
        assert_eq!(payload["sorting_property"], json!("price"));
    }

    #[tokio::test]
    async fn test_changing_filters_refetches_posts() {
        let (client, transport, _) = mock_client();
        transport.succeed(paths::MAXIMUM_PRICE, json!(900));
        transport.succeed(paths::SEARCH_POSTS, json!([]));

        let mut results = SearchResults::new(&client, PostSearch::text("lamp"));
        results.load().await.unwrap();
        results.posts().await.unwrap();
        assert_eq!(transport.call_count(paths::SEARCH_POSTS), 1);

        let filters = PostSearch {
            sorting_property: SortingProperty::SentDatetime,
            minimum_price: Decimal::new(100, 0),
            maximum_price: Some(Decimal::new(300, 0)),
            ..results.filters().clone()
        };
        results.apply_filters(filters).await.unwrap();

        let requests = transport.requests_to(paths::SEARCH_POSTS);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].payload["sorting_property"], json!("sent_datetime"));
        assert_eq!(requests[1].payload["minimum_price"], json!(100.0));
        assert_eq!(requests[1].payload["maximum_price"], json!(300.0));
        assert_eq!(transport.call_count(paths::MAXIMUM_PRICE), 1);
    }

    #[tokio::test]
    async fn test_returning_to_earlier_text_with_new_filters_refetches() {
        let (client, transport, _) = mock_client();
        transport.succeed(paths::MAXIMUM_PRICE, json!(900));
        transport.succeed(paths::SEARCH_POSTS, json!([]));

        let mut results = SearchResults::new(&client, PostSearch::text("lamp"));
        results.load().await.unwrap();
        results.apply_filters(PostSearch::text("desk")).await.unwrap();
        let filters = PostSearch { minimum_price: Decimal::new(100, 0), ..PostSearch::text("lamp") };
        results.apply_filters(filters).await.unwrap();

        let requests = transport.requests_to(paths::SEARCH_POSTS);
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].payload["searched_text"], json!("lamp"));
        assert_eq!(requests[2].payload["minimum_price"], json!(100.0));
    }

    #[tokio::test]
    async fn test_filter_combinations_use_distinct_keys() {
        let (client, _, _) = mock_client();
        let plain = SearchResults::new(&client, PostSearch::text("lamp"));
        let filtered = SearchResults::new(
            &client,
            PostSearch { categories: vec!["home".to_string()], ..PostSearch::text("lamp") },
        );
        assert_ne!(plain.posts_key(), filtered.posts_key());
        assert_eq!(plain.posts_key(), SearchResults::new(&client, PostSearch::text("lamp")).posts_key());
    }

    #[tokio::test]
    async fn test_inverted_price_range_is_rejected() {
        let (client, transport, _) = mock_client();
        let mut results = SearchResults::new(&client, PostSearch::text("lamp"));
        let filters = PostSearch {
            minimum_price: Decimal::new(500, 0),
            maximum_price: Some(Decimal::new(100, 0)),
            ..PostSearch::text("lamp")
        };
        assert!(matches!(results.apply_filters(filters).await, Err(ClientError::InvalidInput(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_stores_query() {
        let (client, transport, _) = mock_client();
        transport.succeed(
            paths::SEARCH_STORES,
            json!([{"user_id": "s1", "name": "Lights & Co", "picture": null}]),
        );
        let stores = SearchResults::new(&client, PostSearch::text("lights")).stores().await.unwrap();
        assert_eq!(stores.data.unwrap()[0].name, "Lights & Co");
        assert_eq!(transport.requests()[0].payload, json!({"search": "lights"}));
    }
}
