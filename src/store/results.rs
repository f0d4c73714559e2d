//! The result store: probe name to capability fact.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::format::{parse_record, render_record, CONTEXT_PREFIX, HEADER};
use crate::context::BuildContext;
use crate::error::{ConftestError, Result};
use crate::probe::validate_probe_name;
use crate::result::{Classification, ProbeResult};

/// Mode of the saved artifact; later build steps may run as another user.
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;

/// Mapping from probe name to its latest result.
///
/// Writes are serialized behind a lock; any number of readers may look
/// results up concurrently. Entries are kept sorted by name, so the rendered
/// artifact does not depend on the order probes finished in.
#[derive(Debug, Default)]
pub struct ResultStore {
    context: Option<String>,
    entries: RwLock<BTreeMap<String, ProbeResult>>,
}

impl ResultStore {
    /// Create an empty store not tied to any build context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store stamped with the context's fingerprint.
    pub fn for_context(ctx: &BuildContext) -> Self {
        Self {
            context: Some(ctx.fingerprint()),
            entries: RwLock::default(),
        }
    }

    /// Fingerprint of the context the results were produced under.
    pub fn context_fingerprint(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Whether this store was produced under `ctx`.
    pub fn is_current_for(&self, ctx: &BuildContext) -> bool {
        self.context.as_deref() == Some(ctx.fingerprint().as_str())
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, ProbeResult>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, ProbeResult>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a result, replacing any earlier one for the same probe.
    ///
    /// Returns the replaced result. Names that could not be written back as
    /// a record line are rejected.
    pub fn record(&self, result: ProbeResult) -> Result<Option<ProbeResult>> {
        validate_probe_name(result.probe_name()).map_err(|message| {
            ConftestError::InvalidDefinition {
                name: result.probe_name().to_string(),
                message,
            }
        })?;
        Ok(self.write().insert(result.probe_name().to_string(), result))
    }

    /// The recorded result for `probe`, or `None` if it has not run.
    pub fn lookup(&self, probe: &str) -> Option<ProbeResult> {
        self.read().get(probe).cloned()
    }

    /// The capability fact for `probe`.
    ///
    /// Fails with `NotFound` if the probe has not run and with
    /// `EnvironmentFailure` if its result is indeterminate.
    pub fn capability(&self, probe: &str) -> Result<bool> {
        self.lookup(probe)
            .ok_or_else(|| ConftestError::NotFound {
                probe: probe.to_string(),
            })?
            .require_determinate()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// All results, sorted by probe name.
    pub fn results(&self) -> Vec<ProbeResult> {
        self.read().values().cloned().collect()
    }

    /// Results that could not be determined, sorted by probe name.
    pub fn indeterminate(&self) -> Vec<ProbeResult> {
        self.read()
            .values()
            .filter(|r| r.classification() == Classification::Indeterminate)
            .cloned()
            .collect()
    }

    /// Fail with the first indeterminate result, if any.
    pub fn ensure_determinate(&self) -> Result<()> {
        match self.indeterminate().into_iter().next() {
            Some(result) => result.require_determinate().map(|_| ()),
            None => Ok(()),
        }
    }

    /// Render the artifact. Identical contents always render identically.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(HEADER);
        out.push('\n');
        if let Some(context) = &self.context {
            out.push_str(CONTEXT_PREFIX);
            out.push_str(context);
            out.push('\n');
        }
        for result in self.read().values() {
            out.push_str(&render_record(result));
            out.push('\n');
        }
        out
    }

    /// Parse an artifact produced by [`ResultStore::render`].
    ///
    /// Every malformed line is fatal; nothing is defaulted.
    pub fn parse(text: &str) -> Result<Self> {
        let mut context = None;
        let mut entries = BTreeMap::new();

        for (idx, line) in text.lines().enumerate() {
            let corrupt = |reason: String| ConftestError::StoreCorruption {
                line: idx + 1,
                content: line.to_string(),
                reason,
            };

            if line.trim().is_empty() {
                continue;
            }

            if let Some(comment) = line.strip_prefix('#') {
                if let Some(fingerprint) = line.strip_prefix(CONTEXT_PREFIX) {
                    let valid = !fingerprint.is_empty()
                        && fingerprint.chars().all(|c| c.is_ascii_hexdigit());
                    if !valid {
                        return Err(corrupt("invalid context fingerprint".to_string()));
                    }
                    if context.is_some() {
                        return Err(corrupt("duplicate context line".to_string()));
                    }
                    context = Some(fingerprint.to_string());
                } else if let Some(version) = comment.trim().strip_prefix("kconftest results v") {
                    if version != "1" {
                        return Err(corrupt(format!("unsupported format version {}", version)));
                    }
                }
                continue;
            }

            let result = parse_record(line).map_err(corrupt)?;
            let name = result.probe_name().to_string();
            if entries.insert(name.clone(), result).is_some() {
                return Err(corrupt(format!("duplicate record for probe '{}'", name)));
            }
        }

        Ok(Self {
            context,
            entries: RwLock::new(entries),
        })
    }

    /// Write the artifact atomically: readers see the old or the new file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(self.render().as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(ARTIFACT_MODE))?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        tracing::debug!("wrote {} results to {}", self.len(), path.display());
        Ok(())
    }

    /// Load an artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }
}
