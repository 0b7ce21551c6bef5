//! Backend client configuration

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5047";
pub const DEFAULT_QUERY_PARAM: &str = "search";
pub const BASE_URL_ENV: &str = "LEADSEARCH_BASE_URL";

/// Where the lead API lives and how to talk to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port of the lead API
    pub base_url: String,
    /// Query-string parameter carrying the search text
    pub query_param: String,
    /// Hard ceiling on any single HTTP exchange
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            query_param: DEFAULT_QUERY_PARAM.to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Defaults, with the base URL taken from `LEADSEARCH_BASE_URL` when set
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_query_param(mut self, param: impl Into<String>) -> Self {
        self.query_param = param.into();
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}
