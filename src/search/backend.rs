//! Search endpoint client
//!
//! Defines the transport trait the fetch executor calls. Two implementations:
//! - `HttpSearchBackend`: GETs the search endpoint over HTTP (production)
//! - `MockBackend`: returns scripted payloads with optional latency (testing)
//!
//! `InMemoryLeadStore` also implements the trait for offline use.

use super::session::SearchError;
use crate::config::ClientConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Transport-level failures of a search request.
///
/// The Display text is what a search surface shows in its error state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Client trait for the search endpoint.
///
/// Abstracts over transport so the executor doesn't care how the endpoint
/// is reached. Implementations return the raw JSON payload; shape
/// normalization happens in the executor.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a free-text search against `endpoint`.
    async fn fetch(&self, endpoint: &str, query: &str) -> Result<serde_json::Value, FetchError>;
}

/// Search backend speaking HTTP to the lead API
#[derive(Debug, Clone)]
pub struct HttpSearchBackend {
    client: reqwest::Client,
    base_url: String,
    query_param: String,
    timeout: Duration,
}

impl HttpSearchBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, SearchError> {
        let parsed = reqwest::Url::parse(&config.base_url).map_err(|e| SearchError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(SearchError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "not a base URL".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| SearchError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            query_param: config.query_param.clone(),
            timeout: config.http_timeout,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<reqwest::Url, FetchError> {
        let path = if endpoint.starts_with('/') {
            endpoint.to_string()
        } else {
            format!("/{}", endpoint)
        };
        let url = format!("{}{}", self.base_url, path);
        reqwest::Url::parse(&url).map_err(|e| FetchError::Transport(format!("bad URL {}: {}", url, e)))
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn fetch(&self, endpoint: &str, query: &str) -> Result<serde_json::Value, FetchError> {
        let url = self.endpoint_url(endpoint)?;
        debug!(%url, query, "sending search request");

        let response = self
            .client
            .get(url)
            .query(&[(self.query_param.as_str(), query)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.timeout)
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// A call observed by [`MockBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub endpoint: String,
    pub query: String,
}

/// Mock backend for testing: returns preconfigured payloads.
///
/// Queries without a scripted response get the fallback payload, which
/// defaults to an empty array.
#[derive(Debug)]
pub struct MockBackend {
    responses: HashMap<String, Result<serde_json::Value, FetchError>>,
    latencies: HashMap<String, Duration>,
    default_latency: Duration,
    fallback: serde_json::Value,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            latencies: HashMap::new(),
            default_latency: Duration::ZERO,
            fallback: serde_json::Value::Array(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register a payload for a specific query.
    pub fn with_payload(mut self, query: impl Into<String>, payload: serde_json::Value) -> Self {
        self.responses.insert(query.into(), Ok(payload));
        self
    }

    /// Register a failure for a specific query.
    pub fn with_failure(mut self, query: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(query.into(), Err(error));
        self
    }

    /// Delay the response for a specific query.
    pub fn with_latency(mut self, query: impl Into<String>, latency: Duration) -> Self {
        self.latencies.insert(query.into(), latency);
        self
    }

    /// Delay every response without a per-query latency.
    pub fn with_default_latency(mut self, latency: Duration) -> Self {
        self.default_latency = latency;
        self
    }

    /// Payload for queries with nothing scripted.
    pub fn with_fallback(mut self, payload: serde_json::Value) -> Self {
        self.fallback = payload;
        self
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Queries received so far, in arrival order.
    pub fn queries(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.query).collect()
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn fetch(&self, endpoint: &str, query: &str) -> Result<serde_json::Value, FetchError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                endpoint: endpoint.to_string(),
                query: query.to_string(),
            });

        let latency = self
            .latencies
            .get(query)
            .copied()
            .unwrap_or(self.default_latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match self.responses.get(query) {
            Some(response) => response.clone(),
            None => Ok(self.fallback.clone()),
        }
    }
}
