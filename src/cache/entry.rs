//! Cache entry type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::ProbeResult;

/// A cached probe result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key the entry was stored under.
    pub key: String,
    /// Probe the result belongs to.
    pub probe_name: String,
    /// Fingerprint of the build context the probe ran against.
    pub context_fingerprint: String,
    /// When this entry was cached.
    pub cached_at: DateTime<Utc>,
    /// The stored result.
    pub result: ProbeResult,
}

impl CacheEntry {
    /// Create a new cache entry stamped with the current time.
    pub fn new(key: impl Into<String>, context_fingerprint: impl Into<String>, result: ProbeResult) -> Self {
        Self {
            key: key.into(),
            probe_name: result.probe_name().to_string(),
            context_fingerprint: context_fingerprint.into(),
            cached_at: Utc::now(),
            result,
        }
    }

    /// Get the age of this entry.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.cached_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_entry_creation() {
        let entry = CacheEntry::new("abc", "ctx", ProbeResult::supported("probe"));

        assert_eq!(entry.key, "abc");
        assert_eq!(entry.probe_name, "probe");
        assert_eq!(entry.context_fingerprint, "ctx");
    }

    #[test]
    fn cache_entry_age() {
        let entry = CacheEntry::new("abc", "ctx", ProbeResult::supported("probe"));

        // Age should be very small (< 1 second)
        assert!(entry.age().num_seconds() < 1);
    }

    #[test]
    fn cache_entry_json_round_trip() {
        let entry = CacheEntry::new(
            "abc",
            "ctx",
            ProbeResult::unsupported("probe", Some(1), "probe.c:3:1: error: bad"),
        );
        let json = serde_json::to_string(&entry).unwrap();
        let back: CacheEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.result, entry.result);
        assert_eq!(back.cached_at, entry.cached_at);
    }
}
