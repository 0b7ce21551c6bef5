//! Lead store trait definitions

use super::filter::LeadFilter;
use super::types::{Lead, LeadId, Owner};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during lead store operations
#[derive(Debug, Error)]
pub enum LeadStoreError {
    #[error("Lead not found: {0}")]
    NotFound(LeadId),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for lead store operations
pub type LeadStoreResult<T> = Result<T, LeadStoreError>;

/// Fields supplied when creating a lead.
///
/// The store assigns the id, both timestamps and an empty activity history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: String,
    pub source: String,
    pub owner: Owner,
    pub tags: Vec<String>,
}

/// A partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl LeadPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply every set field to `lead`
    pub fn apply_to(&self, lead: &mut Lead) {
        if let Some(name) = &self.name {
            lead.name = name.clone();
        }
        if let Some(email) = &self.email {
            lead.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            lead.phone = phone.clone();
        }
        if let Some(status) = &self.status {
            lead.status = status.clone();
        }
        if let Some(source) = &self.source {
            lead.source = source.clone();
        }
        if let Some(owner) = &self.owner {
            lead.owner = owner.clone();
        }
        if let Some(tags) = &self.tags {
            lead.tags = tags.clone();
        }
    }
}

/// Trait for lead storage backends
///
/// This is the collaborator the dashboard table talks to. The search
/// controller never goes through it; it only reads what the search
/// endpoint returns.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// List leads matching the filter, sorted and paginated
    async fn list(&self, filter: &LeadFilter) -> LeadStoreResult<Vec<Lead>>;

    /// Load a lead by id
    async fn get(&self, id: &LeadId) -> LeadStoreResult<Option<Lead>>;

    /// Create a lead and return the stored record
    async fn create(&self, lead: NewLead) -> LeadStoreResult<Lead>;

    /// Apply a partial update and return the stored record
    async fn update(&self, id: &LeadId, patch: &LeadPatch) -> LeadStoreResult<Lead>;

    /// Delete a lead; returns false if it did not exist
    async fn delete(&self, id: &LeadId) -> LeadStoreResult<bool>;

    /// Apply the same patch to several leads; returns how many were updated
    async fn bulk_update(&self, ids: &[LeadId], patch: &LeadPatch) -> LeadStoreResult<usize>;
}
