//! Leadsearch: lead management core with incremental search
//!
//! The centerpiece is [`SearchSession`], a search-as-you-type controller
//! that debounces query changes, keeps at most one request live, and
//! guarantees that only the response to the most recently issued request
//! is ever shown, whatever order responses arrive in.
//!
//! # Core Concepts
//!
//! - **Leads**: sales leads as served by the lead API ([`Lead`])
//! - **Lead store**: CRUD collaborator behind the dashboard table ([`LeadStore`])
//! - **Search session**: per-surface search state and control ([`SearchSession`])
//!
//! # Example
//!
//! ```no_run
//! use leadsearch::{SearchOptions, SearchSession, ClientConfig};
//!
//! # async fn run() -> Result<(), leadsearch::SearchError> {
//! let session = SearchSession::connect(&ClientConfig::from_env(), SearchOptions::default())?;
//! session.search("john");
//! let mut updates = session.subscribe();
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow_and_update().clone();
//!     if !snapshot.loading {
//!         println!("{} results", snapshot.data.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod lead;
pub mod search;

pub use config::ClientConfig;
pub use lead::{
    Activity, InMemoryLeadStore, Lead, LeadFilter, LeadId, LeadPatch, LeadStore, LeadStoreError,
    LeadStoreResult, NewLead, Owner, SortDirection, SortKey,
};
pub use search::{
    FetchError, FetchOutcome, HttpSearchBackend, MockBackend, SearchBackend, SearchError,
    SearchOptions, SearchSession, SearchSnapshot, SessionPhase,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
