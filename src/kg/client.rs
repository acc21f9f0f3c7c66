use crate::config::Config;
use crate::error::{KgError, Result};
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

use super::{SearchBackend, DEFAULT_LIMIT};

/// Knowledge Graph Search API client
///
/// Issues one GET per search. No retries, no caching.
pub struct KgSearchClient {
    client: Client,
    endpoint: String,
    api_key: String,
    default_limit: usize,
    indent: bool,
}

impl KgSearchClient {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Knowledge Graph API key, sent as the `key` parameter
    /// * `endpoint` - Search endpoint URL
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: String, endpoint: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            default_limit: DEFAULT_LIMIT,
            indent: true,
        })
    }

    /// Create a client from loaded configuration and an API key read by the caller
    pub fn from_config(config: &Config, api_key: String) -> Result<Self> {
        Ok(Self::new(api_key, config.endpoint().to_string(), config.timeout())?
            .with_default_limit(config.search.default_limit)
            .with_indent(config.search.indent))
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    pub fn with_indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a free-text entity search and return the JSON body unchanged
    ///
    /// # Arguments
    ///
    /// * `query` - Free-text query
    /// * `limit` - Maximum number of results requested
    pub async fn search(&self, query: &str, limit: usize) -> Result<JsonValue> {
        let start = std::time::Instant::now();
        log::debug!("Knowledge Graph search: query={:?} limit={}", query, limit);

        let limit = limit.to_string();
        let indent = if self.indent { "true" } else { "false" };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", query),
                ("limit", limit.as_str()),
                ("indent", indent),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            log::warn!("Knowledge Graph API returned {} for query {:?}", status, query);

            return Err(KgError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let body: JsonValue = serde_json::from_slice(&bytes)
            .map_err(|e| KgError::Decode(format!("Failed to parse response: {}", e)))?;

        log::debug!("Knowledge Graph search took {:?}", start.elapsed());
        Ok(body)
    }
}

impl SearchBackend for KgSearchClient {
    async fn search(&self, query: &str, limit: usize) -> Result<JsonValue> {
        KgSearchClient::search(self, query, limit).await
    }

    fn default_limit(&self) -> usize {
        self.default_limit
    }
}
