//! Observable state of a search session

use crate::lead::Lead;

/// Where a session is in its query → request → commit cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No timer armed and no request live
    #[default]
    Idle,
    /// A debounce timer is armed
    Debouncing,
    /// A request is live and `loading` is set
    Fetching,
    /// The latest live request settled and its outcome was written
    Committed,
    /// Torn down; no further transitions
    Disposed,
}

/// A point-in-time copy of everything a search surface renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    pub query: String,
    pub data: Vec<Lead>,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: SessionPhase,
}

/// Mutable session fields.
///
/// Only the session controller holds one of these; every mutation goes
/// through the transition methods below.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    query: String,
    results: Vec<Lead>,
    loading: bool,
    error: Option<String>,
    phase: SessionPhase,
}

impl SessionState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn record_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Drop results, error and loading without issuing anything
    pub fn reset(&mut self) {
        self.results.clear();
        self.error = None;
        self.loading = false;
        self.phase = SessionPhase::Idle;
    }

    pub fn begin_debounce(&mut self) {
        self.phase = SessionPhase::Debouncing;
    }

    pub fn begin_loading(&mut self) {
        self.loading = true;
        self.error = None;
        self.phase = SessionPhase::Fetching;
    }

    pub fn commit_success(&mut self, results: Vec<Lead>) {
        self.results = results;
        self.error = None;
        self.loading = false;
        self.phase = SessionPhase::Committed;
    }

    pub fn commit_failure(&mut self, message: String) {
        self.results.clear();
        self.error = Some(message);
        self.loading = false;
        self.phase = SessionPhase::Committed;
    }

    pub fn mark_disposed(&mut self) {
        self.loading = false;
        self.phase = SessionPhase::Disposed;
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            query: self.query.clone(),
            data: self.results.clone(),
            loading: self.loading,
            error: self.error.clone(),
            phase: self.phase,
        }
    }
}
