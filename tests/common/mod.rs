//! Common test utilities for search session scenarios
//!
//! Provides a lead fixture resembling the mock backend's data and helpers
//! for driving sessions on paused tokio time.

pub mod fixtures;

pub use fixtures::{fixture_leads, fixture_store, lead_json};

use std::time::Duration;

/// Advance virtual time by `n` milliseconds.
pub async fn advance_ms(n: u64) {
    tokio::time::sleep(Duration::from_millis(n)).await;
}
