//! Probe result caching.
//!
//! Results can be reused across build runs as long as the probe name, the
//! build context fingerprint and the rendered source are unchanged.

pub mod entry;
pub mod store;

pub use entry::CacheEntry;
pub use store::ProbeCache;
