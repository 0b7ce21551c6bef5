//! Per-session search options

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_MIN_QUERY_LENGTH: usize = 1;
pub const DEFAULT_ENDPOINT: &str = "/leads";

/// Options controlling how a session turns queries into requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Quiet period after the last keystroke before a request is issued
    pub debounce_ms: u64,
    /// Queries shorter than this (in characters) never reach the network
    pub min_query_length: usize,
    /// Path of the search endpoint, relative to the backend base URL
    pub endpoint: String,
    /// Give up on a request after this long. `None` waits indefinitely.
    pub request_timeout_ms: Option<u64>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            min_query_length: DEFAULT_MIN_QUERY_LENGTH,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_ms: None,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn with_min_query_length(mut self, len: usize) -> Self {
        self.min_query_length = len;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = Some(ms);
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// True when `query` is too short to be worth a request.
    ///
    /// Length counts characters, not bytes.
    pub fn is_below_minimum(&self, query: &str) -> bool {
        query.chars().count() < self.min_query_length
    }
}
