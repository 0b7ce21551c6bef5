//! Client-side filtering, sorting and pagination for lead tables

use super::types::Lead;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Column a lead list can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Name,
    Email,
    Status,
    Source,
    /// Sorts by the owner's display name
    Owner,
    #[default]
    CreatedAt,
    LastActivityAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Filter criteria for listing leads
///
/// `None` for status or source means "all". The default sorts newest first.
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    /// Substring match on name or email (case-insensitive) or phone (verbatim)
    pub search_term: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    /// Number of matching leads to skip
    pub offset: usize,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl LeadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort_key = key;
        self.direction = direction;
        self
    }

    /// Select a 1-based page of `per_page` results
    pub fn with_page(mut self, page: usize, per_page: usize) -> Self {
        self.offset = page.saturating_sub(1).saturating_mul(per_page);
        self.limit = Some(per_page);
        self
    }

    /// Re-sort by `key`, flipping direction when `key` is already active
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.direction = if self.sort_key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.sort_key = key;
    }

    /// Whether a single lead passes the search, status and source criteria
    pub fn matches(&self, lead: &Lead) -> bool {
        let matches_search = match self.search_term.as_deref() {
            None | Some("") => true,
            Some(term) => {
                let needle = term.to_lowercase();
                lead.name.to_lowercase().contains(&needle)
                    || lead.email.to_lowercase().contains(&needle)
                    || lead.phone.contains(term)
            }
        };
        let matches_status = self.status.as_ref().map_or(true, |s| &lead.status == s);
        let matches_source = self.source.as_ref().map_or(true, |s| &lead.source == s);
        matches_search && matches_status && matches_source
    }

    /// Filter, sort and paginate a lead list
    pub fn apply<'a>(&self, leads: impl IntoIterator<Item = &'a Lead>) -> Vec<Lead> {
        let mut matching: Vec<Lead> = leads
            .into_iter()
            .filter(|lead| self.matches(lead))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ord = compare_by(self.sort_key, a, b);
            match self.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let page = matching.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        }
    }
}

fn compare_by(key: SortKey, a: &Lead, b: &Lead) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Email => a.email.cmp(&b.email),
        SortKey::Status => a.status.cmp(&b.status),
        SortKey::Source => a.source.cmp(&b.source),
        SortKey::Owner => a.owner.name.cmp(&b.owner.name),
        SortKey::CreatedAt => compare_dates(a.created_at(), b.created_at()),
        SortKey::LastActivityAt => compare_dates(a.last_activity_at(), b.last_activity_at()),
    }
}

// Unparseable timestamps sort as the oldest.
fn compare_dates(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Lead> {
        vec![
            Lead::new("1", "Alice")
                .with_email("alice@acme.io")
                .with_phone("0811")
                .with_status("new")
                .with_source("web")
                .with_created_at("2024-01-01T00:00:00Z"),
            Lead::new("2", "Bob")
                .with_email("bob@globex.io")
                .with_phone("0822")
                .with_status("contacted")
                .with_source("referral")
                .with_created_at("2024-03-01T00:00:00Z"),
            Lead::new("3", "Carol")
                .with_email("carol@acme.io")
                .with_phone("0833")
                .with_status("new")
                .with_source("referral")
                .with_created_at("garbage"),
        ]
    }

    fn ids(leads: &[Lead]) -> Vec<&str> {
        leads.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn default_filter_sorts_newest_first() {
        let leads = sample();
        let result = LeadFilter::new().apply(&leads);
        assert_eq!(ids(&result), vec!["2", "1", "3"]);
    }

    #[test]
    fn search_term_matches_name_email_and_phone() {
        let leads = sample();
        assert_eq!(ids(&LeadFilter::new().with_search_term("ACME").apply(&leads)), vec!["1", "3"]);
        assert_eq!(ids(&LeadFilter::new().with_search_term("0822").apply(&leads)), vec!["2"]);
        assert_eq!(LeadFilter::new().with_search_term("new").apply(&leads).len(), 0);
    }

    #[test]
    fn status_and_source_combine() {
        let leads = sample();
        let result = LeadFilter::new()
            .with_status("new")
            .with_source("referral")
            .apply(&leads);
        assert_eq!(ids(&result), vec!["3"]);
    }

    #[test]
    fn sort_by_name_ascending_and_paginate() {
        let leads = sample();
        let filter = LeadFilter::new()
            .sorted_by(SortKey::Name, SortDirection::Asc)
            .with_page(2, 2);
        assert_eq!(ids(&filter.apply(&leads)), vec!["3"]);
    }

    #[test]
    fn huge_page_number_saturates_offset() {
        let filter = LeadFilter::new().with_page(usize::MAX, 50);
        assert_eq!(filter.offset, usize::MAX);
        assert!(filter.apply(&sample()).is_empty());
    }

    #[test]
    fn toggle_sort_flips_only_on_same_key() {
        let mut filter = LeadFilter::new();
        filter.toggle_sort(SortKey::Name);
        assert_eq!((filter.sort_key, filter.direction), (SortKey::Name, SortDirection::Asc));
        filter.toggle_sort(SortKey::Name);
        assert_eq!(filter.direction, SortDirection::Desc);
        filter.toggle_sort(SortKey::Email);
        assert_eq!((filter.sort_key, filter.direction), (SortKey::Email, SortDirection::Asc));
    }
}
