//! Cache storage implementation.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::entry::CacheEntry;
use crate::context::BuildContext;
use crate::probe::{render_unit, ProbeDefinition};
use crate::result::ProbeResult;

/// On-disk cache of determinate probe results.
///
/// One JSON file per (probe, context, source) key. Indeterminate results are
/// never stored, so a broken environment is diagnosed again on the next run.
#[derive(Debug, Clone)]
pub struct ProbeCache {
    /// Root directory for cache.
    root: PathBuf,
}

impl ProbeCache {
    /// Create a new cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the cache directory exists.
    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create cache directory {:?}", self.root))
    }

    /// Key for a probe evaluated against a context.
    pub fn key(def: &ProbeDefinition, ctx: &BuildContext) -> String {
        let mut hasher = Sha256::new();
        hasher.update(def.name().as_bytes());
        hasher.update(b"\0");
        hasher.update(ctx.fingerprint().as_bytes());
        hasher.update(b"\0");
        hasher.update(render_unit(def).as_bytes());
        hasher.update(b"\0");
        hasher.update(if def.link_required() { b"link" } else { b"comp" });
        hasher.update(b"\0");
        hasher.update(def.symbol().unwrap_or_default().as_bytes());
        let hash = hasher.finalize();
        hex::encode(&hash[..16])
    }

    /// Path of the entry file for a key.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    /// Look up a cached result. Unreadable entries count as misses.
    pub fn get(&self, def: &ProbeDefinition, ctx: &BuildContext) -> Option<ProbeResult> {
        let key = Self::key(def, ctx);
        let path = self.entry_path(&key);
        if !path.exists() {
            return None;
        }

        let entry = match self.read_entry(&path) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {:#}", path.display(), e);
                return None;
            }
        };

        if entry.key != key || entry.probe_name != def.name() || !entry.result.classification().is_determinate() {
            tracing::warn!("Ignoring mismatched cache entry {}", path.display());
            return None;
        }

        tracing::debug!(probe = def.name(), "cache hit");
        Some(entry.result)
    }

    /// Store a result. Returns `false` if the result is not cacheable.
    pub fn put(&self, def: &ProbeDefinition, ctx: &BuildContext, result: &ProbeResult) -> Result<bool> {
        if !result.classification().is_determinate() || result.probe_name() != def.name() {
            return Ok(false);
        }
        self.ensure_dir()?;

        let key = Self::key(def, ctx);
        let entry = CacheEntry::new(&key, ctx.fingerprint(), result.clone());
        let json = serde_json::to_string_pretty(&entry)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .with_context(|| format!("Failed to create temp file in {:?}", self.root))?;
        tmp.write_all(json.as_bytes())?;
        let path = self.entry_path(&key);
        tmp.persist(&path)
            .with_context(|| format!("Failed to write cache entry {:?}", path))?;

        Ok(true)
    }

    /// Remove the cached result for a probe.
    pub fn remove(&self, def: &ProbeDefinition, ctx: &BuildContext) -> Result<bool> {
        let path = self.entry_path(&Self::key(def, ctx));
        if path.exists() {
            fs::remove_file(&path)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn read_entry(&self, path: &Path) -> Result<CacheEntry> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// List all readable entries, sorted by probe name then age.
    pub fn list(&self) -> Result<Vec<CacheEntry>> {
        self.ensure_dir()?;

        let mut entries = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();

            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(cache_entry) = self.read_entry(&path) {
                    entries.push(cache_entry);
                }
            }
        }

        entries.sort_by(|a, b| {
            a.probe_name
                .cmp(&b.probe_name)
                .then(b.cached_at.cmp(&a.cached_at))
        });
        Ok(entries)
    }

    /// Clear all cached entries.
    pub fn clear(&self) -> Result<usize> {
        let entries = self.list()?;
        let count = entries.len();

        for entry in entries {
            let _ = fs::remove_file(self.entry_path(&entry.key));
        }

        Ok(count)
    }

    /// Remove entries older than `max_age`.
    pub fn prune_older_than(&self, max_age: chrono::Duration) -> Result<usize> {
        let mut removed = 0;
        for entry in self.list()? {
            if entry.age() > max_age {
                fs::remove_file(self.entry_path(&entry.key))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
