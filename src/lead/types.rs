//! Lead representation as served by the lead backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identifier of a lead, as assigned by the backend.
///
/// Backends may send ids as strings or numbers; numbers are kept in their
/// decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LeadId(String);

impl<'de> Deserialize<'de> for LeadId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "lead id must be a string or number, got {}",
                other
            ))),
        }
    }
}

impl LeadId {
    /// Mint a fresh identifier for a lead created locally
    pub fn generate() -> Self {
        Self(format!("lead_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LeadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LeadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The sales rep a lead is assigned to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
}

impl Owner {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One entry of a lead's activity history (call, email, meeting, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub at: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
}

/// A sales lead.
///
/// Only `id` is required on the wire. The search endpoint may return partial
/// records, so every other field falls back to its default when absent or
/// null, and scalar values in text fields are kept in their string form.
/// Timestamps are kept verbatim; use [`Lead::created_at`] and
/// [`Lead::last_activity_at`] for parsed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub owner: Owner,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub tags: Vec<String>,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient::string")]
    pub created_at_raw: String,
    #[serde(rename = "lastActivityAt", default, deserialize_with = "lenient::string")]
    pub last_activity_at_raw: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub activities: Vec<Activity>,
}

impl Lead {
    /// Create a lead with the given id and name and empty everything else
    pub fn new(id: impl Into<LeadId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            status: String::new(),
            source: String::new(),
            owner: Owner::default(),
            tags: Vec::new(),
            created_at_raw: String::new(),
            last_activity_at_raw: String::new(),
            activities: Vec::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_created_at(mut self, at: impl Into<String>) -> Self {
        self.created_at_raw = at.into();
        self
    }

    pub fn with_last_activity_at(mut self, at: impl Into<String>) -> Self {
        self.last_activity_at_raw = at.into();
        self
    }

    /// Creation time, if the backend sent a parseable RFC 3339 timestamp
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at_raw)
    }

    /// Time of the most recent activity, if parseable
    pub fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.last_activity_at_raw)
    }

    /// Whether this lead matches a free-text search term.
    ///
    /// Case-insensitive substring match over name, email, phone, status and
    /// tags. An empty term matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.name, &self.email, &self.phone, &self.status]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Field decoders that accept what loosely typed backends actually send
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Null becomes empty, numbers and booleans become their text form
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    /// Null becomes empty, items are stringified and null items dropped
    pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
            Value::Null => Vec::new(),
            single => scalar_text(single).into_iter().collect(),
        })
    }

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}
