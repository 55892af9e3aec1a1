//! Transports carrying service requests to the backend

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::trace;

use super::NetworkError;
use crate::config::GatewayConfig;

/// One outgoing service call
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    /// Logical path, e.g. `/posts_service/get_post_by_id`
    pub path: String,
    pub payload: Value,
    /// Attached when a session exists at send time
    pub bearer_token: Option<String>,
    pub request_id: String,
}

/// Moves a request to the backend and returns the raw response body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ServiceRequest) -> Result<Vec<u8>, NetworkError>;
}

/// JSON over HTTP POST
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &GatewayConfig) -> Result<Self, NetworkError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| NetworkError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ServiceRequest) -> Result<Vec<u8>, NetworkError> {
        let url = self.url_for(&request.path);
        trace!(url = %url, request_id = %request.request_id, "POST");

        let mut builder = self
            .http
            .post(&url)
            .header("x-request-id", &request.request_id)
            .json(&request.payload);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| classify(&request.path, e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| classify(&request.path, e))?;

        if body.is_empty() {
            return Err(NetworkError::EmptyResponse {
                path: request.path.clone(),
                status: status.as_u16(),
            });
        }
        Ok(body.to_vec())
    }
}

fn classify(path: &str, err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout { path: path.to_string() }
    } else {
        NetworkError::Unreachable { path: path.to_string(), reason: err.to_string() }
    }
}
