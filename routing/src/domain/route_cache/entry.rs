//! Cache entries and their durable JSON encoding.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::RouteResult;

/// A cached route plus the instant it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct CacheEntry {
    pub(super) data: RouteResult,
    pub(super) timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub(super) fn new(data: RouteResult, timestamp: DateTime<Utc>) -> Self {
        Self { data, timestamp }
    }

    /// Entries are expired once their age is strictly greater than `ttl`.
    pub(super) fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now.signed_duration_since(self.timestamp) > ttl
    }

    pub(super) fn encode(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|error| format!("encode cache entry: {error}"))
    }

    pub(super) fn decode(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|error| format!("decode cache entry: {error}"))
    }
}
