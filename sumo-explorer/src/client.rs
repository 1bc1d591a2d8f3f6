//! Transport to the Sumo API
//!
//! Collections only talk to [`SearchClient`]. [`SumoClient`] is the HTTP
//! implementation; tests swap in an in-memory one.

use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, Result};
use crate::metrics::record_request;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

/// Remote search/blob service consumed by collections and objects.
///
/// Implementations must not retry on their own account inside a paginated
/// walk; failures are surfaced to the caller unchanged.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// POST a JSON body and return the raw response body
    async fn post(&self, path: &str, body: &Value) -> Result<Bytes>;

    /// GET a JSON document
    async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value>;

    /// Fetch the blob stored for an object
    async fn get_blob(&self, object_id: &str) -> Result<Bytes>;
}

/// POST a JSON body and decode the JSON response
pub async fn post_json<T: DeserializeOwned>(
    client: &dyn SearchClient,
    path: &str,
    body: &Value,
) -> Result<T> {
    let bytes = client.post(path, body).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Path of the blob endpoint for an object
pub fn blob_path(object_id: &str) -> String {
    format!("/objects('{}')/blob", object_id)
}

/// HTTP client for the Sumo API
pub struct SumoClient {
    client: Client,
    base_url: String,
}

impl SumoClient {
    /// Create a client for the configured environment
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.token {
            let value: reqwest::header::HeaderValue =
                format!("Bearer {}", token).parse().map_err(|_| {
                ExplorerError::Config("token contains invalid header characters".to_string())
            })?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, method: &str, path: &str, request: RequestBuilder) -> Result<Bytes> {
        let start = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                record_request(method, path, "error", start.elapsed());
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            record_request(method, path, status.as_str(), start.elapsed());
            return Err(ExplorerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        record_request(method, path, status.as_str(), start.elapsed());
        debug!(method, path, bytes = bytes.len(), "Sumo request completed");
        Ok(bytes)
    }
}

#[async_trait]
impl SearchClient for SumoClient {
    async fn post(&self, path: &str, body: &Value) -> Result<Bytes> {
        let request = self.client.post(self.url(path)).json(body);
        self.send("POST", path, request).await
    }

    async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let request = self.client.get(self.url(path)).query(params);
        let bytes = self.send("GET", path, request).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_blob(&self, object_id: &str) -> Result<Bytes> {
        let path = blob_path(object_id);
        let request = self.client.get(self.url(&path));
        self.send("GET", "/objects/blob", request).await
    }
}
