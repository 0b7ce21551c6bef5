//! Lead records and the lead store collaborator
//!
//! Leads are owned by the store; the search controller only reads the
//! records the search endpoint hands back.

mod filter;
mod memory;
mod store;
mod types;

pub use filter::{LeadFilter, SortDirection, SortKey};
pub use memory::InMemoryLeadStore;
pub use store::{LeadPatch, LeadStore, LeadStoreError, LeadStoreResult, NewLead};
pub use types::{Activity, Lead, LeadId, Owner};
