//! Fetch executor: one search call, settled into an outcome
//!
//! Cancellation is cooperative. The executor races the transport against the
//! token's cancellation signal and reports `Cancelled` instead of an error,
//! but whether an abandoned request physically stops is up to the transport.

use super::backend::{FetchError, SearchBackend};
use super::guard::RequestToken;
use crate::lead::Lead;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Field holding the result collection when the endpoint wraps it in an object
pub const LEADS_FIELD: &str = "leads";

/// How a single search request settled
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Vec<Lead>),
    /// Transport or HTTP failure, as a human-readable message
    Failure(String),
    /// Superseded or disposed before it settled
    Cancelled,
}

/// Turn a search payload into leads.
///
/// A bare array is used as-is; an object with a `leads` array contributes
/// that array; anything else is empty. Loosely typed records (null fields,
/// numeric ids) are kept; only elements without a usable `id` are skipped.
pub fn normalize_payload(payload: Value) -> Vec<Lead> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(LEADS_FIELD) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Lead>(item) {
            Ok(lead) => Some(lead),
            Err(e) => {
                warn!(index, error = %e, "skipping undecodable lead record");
                None
            }
        })
        .collect()
}

/// Performs search calls against a backend
#[derive(Clone)]
pub struct FetchExecutor {
    backend: Arc<dyn SearchBackend>,
    endpoint: String,
    timeout: Option<Duration>,
}

impl FetchExecutor {
    pub fn new(backend: Arc<dyn SearchBackend>, endpoint: impl Into<String>) -> Self {
        Self {
            backend,
            endpoint: endpoint.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the search for `query` under `token`.
    pub async fn execute(&self, query: &str, token: &RequestToken) -> FetchOutcome {
        if token.is_cancelled() {
            return FetchOutcome::Cancelled;
        }

        let settled = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(generation = token.generation(), query, "request cancelled in flight");
                return FetchOutcome::Cancelled;
            }
            result = self.fetch(query) => result,
        };

        // Cancellation may land between settlement and this check.
        if token.is_cancelled() {
            return FetchOutcome::Cancelled;
        }

        match settled {
            Ok(payload) => FetchOutcome::Success(normalize_payload(payload)),
            Err(e) => {
                warn!(generation = token.generation(), query, error = %e, "search request failed");
                FetchOutcome::Failure(e.to_string())
            }
        }
    }

    async fn fetch(&self, query: &str) -> Result<Value, FetchError> {
        let request = self.backend.fetch(&self.endpoint, query);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| FetchError::Timeout(limit))?,
            None => request.await,
        }
    }
}

impl std::fmt::Debug for FetchExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchExecutor")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
