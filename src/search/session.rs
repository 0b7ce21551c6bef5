//! SearchSession: the incremental search controller
//!
//! One session per search surface. Callers drive it with `search`,
//! `clear_search` and `cleanup`; timers and request settlements arrive on
//! runtime tasks and re-enter through the same lock. Every settlement is
//! checked against the live request token before it touches state, so
//! responses can arrive in any order without an older one ever winning.

use super::backend::{HttpSearchBackend, SearchBackend};
use super::debounce::{Schedule, TimerId};
use super::executor::{FetchExecutor, FetchOutcome};
use super::guard::RequestToken;
use super::lifecycle::Lifecycle;
use super::options::SearchOptions;
use super::state::{SearchSnapshot, SessionPhase, SessionState};
use crate::config::ClientConfig;
use crate::lead::Lead;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, trace};

/// Errors that can occur while setting up a search session
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no tokio runtime available; create the session from within a runtime")]
    NoRuntime,

    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

struct SessionInner {
    state: SessionState,
    lifecycle: Lifecycle,
    options: SearchOptions,
}

struct Shared {
    inner: Mutex<SessionInner>,
    backend: Arc<dyn SearchBackend>,
    updates: watch::Sender<SearchSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &SessionInner) {
        self.updates.send_replace(inner.state.snapshot());
    }

    /// Apply a settled request, if it is still the live one.
    fn settle(&self, token: &RequestToken, query: &str, outcome: FetchOutcome) {
        let mut inner = self.lock();
        if inner.lifecycle.is_disposed() {
            trace!(generation = token.generation(), "discarding settlement after dispose");
            return;
        }
        if matches!(outcome, FetchOutcome::Cancelled) {
            trace!(generation = token.generation(), query, "request cancelled");
            return;
        }
        if !inner.lifecycle.guard.settle(token) {
            trace!(generation = token.generation(), query, "discarding stale response");
            return;
        }

        match outcome {
            FetchOutcome::Success(leads) => {
                debug!(generation = token.generation(), query, results = leads.len(), "search committed");
                inner.state.commit_success(leads);
            }
            FetchOutcome::Failure(message) => {
                debug!(generation = token.generation(), query, error = %message, "search failed");
                inner.state.commit_failure(message);
            }
            FetchOutcome::Cancelled => {}
        }
        // A newer query may already be waiting out its debounce window.
        if inner.lifecycle.scheduler.is_armed() {
            inner.state.begin_debounce();
        }
        self.publish(&inner);
    }
}

/// Runs when a debounce timer expires: issue the request, await it, settle.
async fn run_search(session: Weak<Shared>, timer: TimerId, query: String, executor: FetchExecutor) {
    let token = {
        let Some(shared) = session.upgrade() else {
            return;
        };
        let mut inner = shared.lock();
        if inner.lifecycle.is_disposed() || !inner.lifecycle.scheduler.fire_if_current(timer) {
            trace!(query = %query, "debounce timer superseded before firing");
            return;
        }
        let token = inner.lifecycle.guard.begin_request();
        inner.state.begin_loading();
        shared.publish(&inner);
        debug!(generation = token.generation(), query = %query, "issuing search request");
        token
    };

    let outcome = executor.execute(&query, &token).await;

    if let Some(shared) = session.upgrade() {
        shared.settle(&token, &query, outcome);
    }
}

/// Incremental search controller for one search surface.
///
/// Must be created inside a tokio runtime; debounce timers and requests run
/// as tasks on it. Dropping the session is the same as calling
/// [`cleanup`](Self::cleanup).
pub struct SearchSession {
    shared: Arc<Shared>,
}

impl SearchSession {
    /// Create a session on the current tokio runtime.
    pub fn new(backend: Arc<dyn SearchBackend>, options: SearchOptions) -> Result<Self, SearchError> {
        let runtime = Handle::try_current().map_err(|_| SearchError::NoRuntime)?;
        Ok(Self::with_runtime(backend, options, runtime))
    }

    /// Create a session whose timers and requests run on `runtime`.
    pub fn with_runtime(backend: Arc<dyn SearchBackend>, options: SearchOptions, runtime: Handle) -> Self {
        let (updates, _) = watch::channel(SearchSnapshot::default());
        let inner = SessionInner {
            state: SessionState::default(),
            lifecycle: Lifecycle::new(runtime),
            options,
        };
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                backend,
                updates,
            }),
        }
    }

    /// Create a session searching the HTTP lead API described by `config`.
    pub fn connect(config: &ClientConfig, options: SearchOptions) -> Result<Self, SearchError> {
        let backend = HttpSearchBackend::new(config)?;
        Self::new(Arc::new(backend), options)
    }

    /// Record a new query and schedule a search for it.
    ///
    /// An empty query clears everything immediately. A query shorter than
    /// the minimum length clears results without a request. Anything else
    /// is searched once it has been stable for the debounce window.
    pub fn search(&self, query: &str) {
        let mut inner = self.shared.lock();
        self.search_locked(&mut inner, query);
    }

    /// Replace the session's options, then [`search`](Self::search).
    pub fn search_with(&self, query: &str, options: SearchOptions) {
        let mut inner = self.shared.lock();
        if !inner.lifecycle.is_disposed() {
            inner.options = options;
        }
        self.search_locked(&mut inner, query);
    }

    /// Same as searching for the empty string.
    pub fn clear_search(&self) {
        self.search("");
    }

    /// Cancel pending work and stop accepting input.
    ///
    /// Must be called when the search surface goes away. Results of requests
    /// still in flight are discarded when they settle. Idempotent.
    pub fn cleanup(&self) {
        let mut inner = self.shared.lock();
        if inner.lifecycle.is_disposed() {
            return;
        }
        inner.lifecycle.dispose();
        inner.state.mark_disposed();
        self.shared.publish(&inner);
    }

    fn search_locked(&self, inner: &mut SessionInner, query: &str) {
        if inner.lifecycle.is_disposed() {
            debug!(query, "ignoring search on disposed session");
            return;
        }
        inner.state.record_query(query);

        if !query.is_empty() && inner.options.is_below_minimum(query) {
            trace!(query, min = inner.options.min_query_length, "query below minimum length");
            inner.lifecycle.cancel_all();
            inner.state.reset();
            self.shared.publish(inner);
            return;
        }

        let executor = FetchExecutor::new(self.shared.backend.clone(), inner.options.endpoint.clone())
            .with_timeout(inner.options.request_timeout());
        let delay = inner.options.debounce();
        let session = Arc::downgrade(&self.shared);

        let scheduled = inner.lifecycle.scheduler.schedule(query, delay, move |timer, query| {
            run_search(session, timer, query, executor)
        });
        match scheduled {
            Schedule::Armed(_) => {
                trace!(query, ?delay, "search debounced");
                inner.state.begin_debounce();
            }
            Schedule::Bypassed => {
                inner.lifecycle.cancel_all();
                inner.state.reset();
            }
        }
        self.shared.publish(inner);
    }

    /// Current query text
    pub fn query(&self) -> String {
        self.shared.lock().state.query().to_string()
    }

    /// Results of the latest committed search
    pub fn data(&self) -> Vec<Lead> {
        self.snapshot().data
    }

    pub fn loading(&self) -> bool {
        self.snapshot().loading
    }

    pub fn error(&self) -> Option<String> {
        self.snapshot().error
    }

    pub fn phase(&self) -> SessionPhase {
        self.shared.lock().state.phase()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.shared.lock().state.snapshot()
    }

    /// True while a debounce timer is armed or a request is live
    pub fn has_pending_work(&self) -> bool {
        !self.shared.lock().lifecycle.is_quiescent()
    }

    pub fn options(&self) -> SearchOptions {
        self.shared.lock().options.clone()
    }

    /// Receive a snapshot after every visible state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.shared.updates.subscribe()
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::backend::{FetchError, MockBackend};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn session_with(backend: &Arc<MockBackend>) -> SearchSession {
        SearchSession::new(backend.clone(), SearchOptions::default()).unwrap()
    }

    fn names(leads: &[Lead]) -> Vec<&str> {
        leads.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn new_outside_runtime_fails() {
        let err = SearchSession::new(Arc::new(MockBackend::new()), SearchOptions::default()).unwrap_err();
        assert!(matches!(err, SearchError::NoRuntime));
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_queries_fires_one_request_for_last() {
        let backend = Arc::new(MockBackend::new());
        let session = session_with(&backend);

        for query in ["a", "ab", "abc"] {
            session.search(query);
            sleep(ms(100)).await;
        }
        assert_eq!(session.phase(), SessionPhase::Debouncing);
        sleep(ms(500)).await;

        assert_eq!(backend.queries(), vec!["abc".to_string()]);
        assert_eq!(session.phase(), SessionPhase::Committed);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_spans_the_request() {
        let backend = Arc::new(
            MockBackend::new()
                .with_payload("john", json!([{"id": "1", "name": "John Doe"}]))
                .with_latency("john", ms(100)),
        );
        let session = session_with(&backend);

        session.search("john");
        sleep(ms(250)).await;
        assert!(!session.loading());
        assert_eq!(backend.call_count(), 0);

        sleep(ms(100)).await;
        assert!(session.loading());
        assert_eq!(session.phase(), SessionPhase::Fetching);

        sleep(ms(100)).await;
        let snap = session.snapshot();
        assert!(!snap.loading);
        assert_eq!(names(&snap.data), vec!["John Doe"]);
        assert_eq!(snap.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_query_mid_fetch_clears_immediately() {
        let backend = Arc::new(
            MockBackend::new()
                .with_payload("jo", json!([{"id": "1"}]))
                .with_latency("jo", ms(1000)),
        );
        let session = session_with(&backend);

        session.search("jo");
        sleep(ms(400)).await;
        assert!(session.loading());

        session.search("");
        let snap = session.snapshot();
        assert!(snap.data.is_empty());
        assert!(!snap.loading);
        assert_eq!(snap.error, None);
        assert_eq!(snap.phase, SessionPhase::Idle);
        assert!(!session.has_pending_work());

        sleep(ms(2000)).await;
        assert!(session.data().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_never_hits_network_and_clears_results() {
        let backend = Arc::new(MockBackend::new().with_fallback(json!([{"id": "1"}])));
        let session = SearchSession::new(
            backend.clone(),
            SearchOptions::default().with_min_query_length(3),
        )
        .unwrap();

        session.search("abc");
        sleep(ms(400)).await;
        assert_eq!(session.data().len(), 1);

        session.search("ab");
        assert_eq!(session.query(), "ab");
        assert!(session.data().is_empty());
        sleep(ms(400)).await;

        assert_eq!(backend.call_count(), 1);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_failing_request_never_surfaces_error() {
        let backend = Arc::new(
            MockBackend::new()
                .with_failure("jo", FetchError::Status(503))
                .with_latency("jo", ms(2000))
                .with_payload("joh", json!([{"id": "2", "name": "Johanna"}]))
                .with_latency("joh", ms(10)),
        );
        let session = session_with(&backend);

        session.search("jo");
        sleep(ms(400)).await;
        assert!(session.loading());
        session.search("joh");

        // "joh" fires at 700ms and cancels "jo", which is still in flight.
        sleep(ms(305)).await;
        assert!(session.loading());
        assert_eq!(session.error(), None);

        sleep(ms(100)).await;
        assert!(!session.loading());
        assert_eq!(session.error(), None);
        assert_eq!(names(&session.data()), vec!["Johanna"]);

        // Past the point where "jo" would have failed.
        sleep(ms(3000)).await;
        let snap = session.snapshot();
        assert!(!snap.loading);
        assert_eq!(snap.error, None);
        assert_eq!(names(&snap.data), vec!["Johanna"]);
        assert_eq!(snap.phase, SessionPhase::Committed);
        assert_eq!(backend.queries(), vec!["jo".to_string(), "joh".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_sets_error_and_next_success_clears_it() {
        let backend = Arc::new(
            MockBackend::new()
                .with_failure("bad", FetchError::Status(500))
                .with_payload("good", json!({"leads": [{"id": "2", "name": "Jane"}]})),
        );
        let session = session_with(&backend);

        session.search("bad");
        sleep(ms(400)).await;
        assert_eq!(session.error().as_deref(), Some("HTTP error! status: 500"));
        assert!(session.data().is_empty());
        assert!(!session.loading());

        session.search("good");
        sleep(ms(400)).await;
        assert_eq!(session.error(), None);
        assert_eq!(names(&session.data()), vec!["Jane"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_success_is_discarded_regardless_of_arrival_order() {
        let backend = Arc::new(MockBackend::new());
        let session = session_with(&backend);

        let (old, new) = {
            let mut inner = session.shared.lock();
            let old = inner.lifecycle.guard.begin_request();
            let new = inner.lifecycle.guard.begin_request();
            inner.state.begin_loading();
            (old, new)
        };

        session
            .shared
            .settle(&new, "abc", FetchOutcome::Success(vec![Lead::new("2", "New")]));
        session
            .shared
            .settle(&old, "ab", FetchOutcome::Success(vec![Lead::new("1", "Old")]));

        assert_eq!(names(&session.data()), vec!["New"]);
        assert!(!session.loading());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_failure_does_not_clobber_results() {
        let backend = Arc::new(MockBackend::new());
        let session = session_with(&backend);

        let (old, new) = {
            let mut inner = session.shared.lock();
            (inner.lifecycle.guard.begin_request(), inner.lifecycle.guard.begin_request())
        };
        session
            .shared
            .settle(&new, "abc", FetchOutcome::Success(vec![Lead::new("2", "New")]));
        session.shared.settle(&old, "ab", FetchOutcome::Failure("late".to_string()));

        assert_eq!(session.error(), None);
        assert_eq!(session.data().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn settlement_after_cleanup_is_ignored() {
        let backend = Arc::new(MockBackend::new().with_default_latency(ms(1000)));
        let session = session_with(&backend);

        session.search("john");
        sleep(ms(400)).await;
        assert!(session.loading());
        let live = {
            let inner = session.shared.lock();
            inner.lifecycle.guard.has_live_request()
        };
        assert!(live);

        session.cleanup();
        let before = session.snapshot();
        assert_eq!(before.phase, SessionPhase::Disposed);
        assert!(!before.loading);

        sleep(ms(2000)).await;
        assert_eq!(session.snapshot(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn forced_settlement_of_token_minted_before_cleanup_is_ignored() {
        let backend = Arc::new(MockBackend::new());
        let session = session_with(&backend);
        session.search("john");

        let token = session.shared.lock().lifecycle.guard.begin_request();
        session.cleanup();
        let before = session.snapshot();

        session
            .shared
            .settle(&token, "john", FetchOutcome::Success(vec![Lead::new("1", "John")]));
        assert_eq!(session.snapshot(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn disposed_session_ignores_input() {
        let backend = Arc::new(MockBackend::new());
        let session = session_with(&backend);
        session.cleanup();

        session.search("john");
        session.clear_search();
        sleep(ms(1000)).await;

        assert_eq!(backend.call_count(), 0);
        assert_eq!(session.query(), "");
        assert_eq!(session.phase(), SessionPhase::Disposed);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_session_cancels_pending_timer() {
        let backend = Arc::new(MockBackend::new());
        let session = session_with(&backend);
        session.search("john");
        drop(session);

        sleep(ms(1000)).await;
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn old_request_settling_during_new_debounce_keeps_debouncing() {
        let backend = Arc::new(
            MockBackend::new()
                .with_payload("ab", json!([{"id": "1", "name": "Abby"}]))
                .with_latency("ab", ms(100))
                .with_payload("abc", json!([{"id": "2", "name": "Abc Corp"}])),
        );
        let session = session_with(&backend);

        session.search("ab");
        sleep(ms(350)).await;
        session.search("abc");
        sleep(ms(100)).await;

        let snap = session.snapshot();
        assert_eq!(names(&snap.data), vec!["Abby"]);
        assert!(!snap.loading);
        assert_eq!(snap.phase, SessionPhase::Debouncing);

        sleep(ms(300)).await;
        assert_eq!(names(&session.data()), vec!["Abc Corp"]);
        assert_eq!(backend.queries(), vec!["ab".to_string(), "abc".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn search_with_replaces_options() {
        let backend = Arc::new(MockBackend::new());
        let session = session_with(&backend);

        session.search_with(
            "jo",
            SearchOptions::default().with_debounce_ms(50).with_endpoint("/api/search"),
        );
        sleep(ms(60)).await;

        assert_eq!(backend.calls()[0].endpoint, "/api/search");
        assert_eq!(session.options().debounce_ms, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_loading_then_result() {
        let backend = Arc::new(
            MockBackend::new()
                .with_payload("john", json!([{"id": "1"}]))
                .with_latency("john", ms(50)),
        );
        let session = session_with(&backend);
        let mut updates = session.subscribe();

        session.search("john");
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().phase, SessionPhase::Debouncing);

        updates.changed().await.unwrap();
        assert!(updates.borrow_and_update().loading);

        updates.changed().await.unwrap();
        let snap = updates.borrow_and_update().clone();
        assert!(!snap.loading);
        assert_eq!(snap.data.len(), 1);
    }
}
