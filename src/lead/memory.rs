//! In-memory lead store
//!
//! Stands in for the REST backend in tests and offline CLI runs. Answers
//! search requests the way the mock backend's `?search=` middleware does.

use super::filter::LeadFilter;
use super::store::{LeadPatch, LeadStore, LeadStoreError, LeadStoreResult, NewLead};
use super::types::{Lead, LeadId};
use crate::search::{normalize_payload, FetchError, SearchBackend};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct Stored {
    /// Insertion sequence, so listings keep the backend's file order
    seq: u64,
    lead: Lead,
}

/// Lead store backed by a concurrent map
#[derive(Debug, Default)]
pub struct InMemoryLeadStore {
    leads: DashMap<LeadId, Stored>,
    next_seq: AtomicU64,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `leads`, preserving their order
    pub fn with_leads(leads: impl IntoIterator<Item = Lead>) -> Self {
        let store = Self::new();
        for lead in leads {
            store.insert(lead);
        }
        store
    }

    /// Load a fixture file holding either a bare array of leads or
    /// an object with a `leads` array
    pub fn from_json_file(path: impl AsRef<Path>) -> LeadStoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let payload: serde_json::Value = serde_json::from_str(&raw)?;
        if !payload.is_array() && !payload.get("leads").is_some_and(|l| l.is_array()) {
            return Err(LeadStoreError::InvalidPayload(
                "expected an array of leads or an object with a `leads` array".to_string(),
            ));
        }
        Ok(Self::with_leads(normalize_payload(payload)))
    }

    /// Insert or replace a lead
    pub fn insert(&self, lead: Lead) {
        let seq = match self.leads.get(&lead.id) {
            Some(existing) => existing.seq,
            None => self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        self.leads.insert(lead.id.clone(), Stored { seq, lead });
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// All leads in insertion order
    pub fn all(&self) -> Vec<Lead> {
        let mut stored: Vec<Stored> = self.leads.iter().map(|r| r.value().clone()).collect();
        stored.sort_by_key(|s| s.seq);
        stored.into_iter().map(|s| s.lead).collect()
    }

    /// Leads matching a free-text term, in insertion order
    pub fn search(&self, term: &str) -> Vec<Lead> {
        self.all()
            .into_iter()
            .filter(|lead| lead.matches_search(term))
            .collect()
    }

    fn touch(lead: &mut Lead) {
        lead.last_activity_at_raw = now_rfc3339();
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn list(&self, filter: &LeadFilter) -> LeadStoreResult<Vec<Lead>> {
        Ok(filter.apply(&self.all()))
    }

    async fn get(&self, id: &LeadId) -> LeadStoreResult<Option<Lead>> {
        Ok(self.leads.get(id).map(|r| r.lead.clone()))
    }

    async fn create(&self, new: NewLead) -> LeadStoreResult<Lead> {
        if new.name.trim().is_empty() {
            return Err(LeadStoreError::InvalidPayload("name is required".to_string()));
        }
        let now = now_rfc3339();
        let lead = Lead {
            id: LeadId::generate(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            status: new.status,
            source: new.source,
            owner: new.owner,
            tags: new.tags,
            created_at_raw: now.clone(),
            last_activity_at_raw: now,
            activities: Vec::new(),
        };
        self.insert(lead.clone());
        Ok(lead)
    }

    async fn update(&self, id: &LeadId, patch: &LeadPatch) -> LeadStoreResult<Lead> {
        let mut entry = self
            .leads
            .get_mut(id)
            .ok_or_else(|| LeadStoreError::NotFound(id.clone()))?;
        patch.apply_to(&mut entry.lead);
        Self::touch(&mut entry.lead);
        Ok(entry.lead.clone())
    }

    async fn delete(&self, id: &LeadId) -> LeadStoreResult<bool> {
        Ok(self.leads.remove(id).is_some())
    }

    async fn bulk_update(&self, ids: &[LeadId], patch: &LeadPatch) -> LeadStoreResult<usize> {
        if ids.is_empty() {
            return Err(LeadStoreError::InvalidPayload("no lead ids given".to_string()));
        }
        let mut updated = 0;
        for id in ids {
            if let Some(mut entry) = self.leads.get_mut(id) {
                patch.apply_to(&mut entry.lead);
                Self::touch(&mut entry.lead);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl SearchBackend for InMemoryLeadStore {
    async fn fetch(&self, _endpoint: &str, query: &str) -> Result<serde_json::Value, FetchError> {
        serde_json::to_value(self.search(query)).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
