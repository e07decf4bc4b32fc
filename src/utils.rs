//! Utility functions shared by the aggregation pipeline.
//!
//! This module provides the wall clock abstraction used for cache expiry and
//! the highway-set fingerprint used as the cache key.

use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

/// Source of the current time in milliseconds since the unix epoch.
///
/// Abstracted so the aggregator cache expiry can be driven manually in tests.
pub trait Clock {
    /// Returns the current time in epoch milliseconds.
    fn now_ms(&self) -> Result<u64, SystemTimeError>;
}

/// [`Clock`] backed by the system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Result<u64, SystemTimeError> {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH)?;
        Ok(elapsed.as_millis() as u64)
    }
}

/// Computes the order-independent fingerprint of a set of highway ids.
///
/// The ids are sorted and joined with a comma, so `["A", "B"]` and `["B", "A"]`
/// produce the same key.
///
/// # Examples
///
/// ```no_run
/// let ids = vec!["Highway 97D".to_string(), "Highway 5".to_string()];
/// assert_eq!(fingerprint(&ids), "Highway 5,Highway 97D");
/// ```
pub fn fingerprint(highway_ids: &[String]) -> String {
    let mut sorted: Vec<&str> = highway_ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(",")
}
