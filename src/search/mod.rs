//! Incremental search controller
//!
//! Turns a rapidly changing query into a sequence of search requests:
//! debounced, with at most one request live, and with only the freshest
//! response ever reaching visible state.
//!
//! Control flow: `SearchSession::search` → `DebounceScheduler` → on fire,
//! `RequestGuard::begin_request` → `FetchExecutor::execute` → on settle,
//! token check → commit or discard.

mod backend;
mod debounce;
mod executor;
mod guard;
mod lifecycle;
mod options;
mod session;
mod state;

pub use backend::{FetchError, HttpSearchBackend, MockBackend, RecordedCall, SearchBackend};
pub use debounce::{DebounceScheduler, Schedule, TimerId};
pub use executor::{normalize_payload, FetchExecutor, FetchOutcome, LEADS_FIELD};
pub use guard::{RequestGuard, RequestToken};
pub use options::{SearchOptions, DEFAULT_DEBOUNCE_MS, DEFAULT_ENDPOINT, DEFAULT_MIN_QUERY_LENGTH};
pub use session::{SearchError, SearchSession};
pub use state::{SearchSnapshot, SessionPhase};
