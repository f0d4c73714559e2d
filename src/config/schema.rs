//! Probe catalog schema.
//!
//! This module contains the struct definitions that map to the YAML catalog
//! format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root of a probe catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogFile {
    /// Build context the probes should run against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextConfig>,

    /// Probe definitions, keyed by probe name
    pub probes: BTreeMap<String, ProbeConfig>,
}

/// Build context section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Compiler driver. Relative paths are resolved against the catalog.
    pub toolchain: PathBuf,

    /// Header search directories, highest priority first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_dirs: Vec<PathBuf>,

    /// Extra driver flags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    /// Environment passed to the toolchain
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Per-probe timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Where scratch directories are created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_root: Option<PathBuf>,
}

/// One probe entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// API under test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    /// Required headers, in include order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,

    /// Link as well as compile
    #[serde(default, skip_serializing_if = "is_false")]
    pub link: bool,

    /// Probe body
    pub source: String,
}

fn is_false(b: &bool) -> bool {
    !*b
}
