//! Wiring of session, gateway, endpoints and cache into one handle

use std::sync::Arc;

use tracing::info;

use crate::api::MarketplaceApi;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::gateway::{HttpTransport, RequestGateway, Transport};
use crate::query::QueryCache;
use crate::session::{DurableStorage, FileStorage, SessionStore};

/// Cheap-to-clone handle shared by every flow
#[derive(Clone)]
pub struct MarketplaceClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    session: Arc<SessionStore>,
    api: MarketplaceApi,
    cache: QueryCache,
}

impl MarketplaceClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn DurableStorage>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(storage));
        let gateway = Arc::new(RequestGateway::new(transport, session.clone()));
        let api = MarketplaceApi::new(gateway);
        let cache = QueryCache::new(config.query.retry.clone());

        Self { inner: Arc::new(Inner { config, session, api, cache }) }
    }

    /// Client over HTTP with the session persisted under the configured data directory
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config.gateway)?;
        let storage = FileStorage::new(&config.session.data_dir)?;
        info!(
            base_url = %transport.base_url(),
            data_dir = %storage.base_path().display(),
            "Marketplace client ready"
        );
        Ok(Self::new(config, Arc::new(transport), Arc::new(storage)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn api(&self) -> &MarketplaceApi {
        &self.inner.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn page_size(&self) -> u32 {
        self.inner.config.query.page_size
    }

    /// Customer id of the current session, or `SessionRequired`
    pub fn require_customer(&self) -> Result<String, ClientError> {
        self.inner.session.customer_id().ok_or(ClientError::SessionRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::test_utils::mock_client;

    #[tokio::test]
    async fn test_require_customer() {
        let (client, _, _) = mock_client();
        assert_eq!(client.require_customer(), Err(ClientError::SessionRequired));

        client.session().set(Session::new("abc", "u1").unwrap()).await.unwrap();
        assert_eq!(client.require_customer().unwrap(), "u1");
    }

    #[test]
    fn test_connect_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::default();
        config.session.data_dir = dir.path().join("nested");

        let client = MarketplaceClient::connect(config).unwrap();
        assert!(dir.path().join("nested").is_dir());
        assert_eq!(client.page_size(), 20);
    }
}
