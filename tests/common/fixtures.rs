//! Lead fixtures shared by the integration tests

use leadsearch::{InMemoryLeadStore, Lead, Owner};
use serde_json::{json, Value};

/// A small book of leads with overlapping names, statuses and tags
pub fn fixture_leads() -> Vec<Lead> {
    vec![
        Lead::new("1", "John Doe")
            .with_email("john.doe@acme.io")
            .with_phone("+62 811 1000")
            .with_status("new")
            .with_source("website")
            .with_owner(Owner::new("u1", "Rina"))
            .with_tag("enterprise")
            .with_created_at("2024-05-01T08:00:00Z"),
        Lead::new("2", "Johanna Smith")
            .with_email("jo.smith@globex.com")
            .with_phone("+62 811 2000")
            .with_status("contacted")
            .with_source("referral")
            .with_owner(Owner::new("u2", "Bima"))
            .with_created_at("2024-05-03T08:00:00Z"),
        Lead::new("3", "Budi Santoso")
            .with_email("budi@initech.id")
            .with_phone("+62 812 3000")
            .with_status("qualified")
            .with_source("event")
            .with_owner(Owner::new("u1", "Rina"))
            .with_tag("john-referral")
            .with_created_at("2024-04-20T08:00:00Z"),
        Lead::new("4", "Sari Dewi")
            .with_email("sari@umbrella.co")
            .with_phone("+62 813 4000")
            .with_status("lost")
            .with_source("website")
            .with_created_at("2024-05-10T08:00:00Z"),
    ]
}

pub fn fixture_store() -> InMemoryLeadStore {
    InMemoryLeadStore::with_leads(fixture_leads())
}

/// Minimal wire record for a lead
pub fn lead_json(id: &str, name: &str) -> Value {
    json!({"id": id, "name": name})
}
