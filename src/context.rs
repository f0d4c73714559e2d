//! Build context: the toolchain and header configuration a probe runs against.
//!
//! The context is supplied by the orchestrator for each build invocation and
//! is read-only here. Nothing in this crate consults environment variables to
//! fill it in, so the same context always yields the same answers.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-probe toolchain timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Toolchain, include path and flag configuration for probe runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    toolchain: PathBuf,
    include_dirs: Vec<PathBuf>,
    flags: Vec<String>,
    env: BTreeMap<String, String>,
    timeout: Duration,
    scratch_root: Option<PathBuf>,
}

impl BuildContext {
    /// Create a context for the given compiler driver.
    pub fn new(toolchain: impl Into<PathBuf>) -> Self {
        Self {
            toolchain: toolchain.into(),
            include_dirs: Vec::new(),
            flags: Vec::new(),
            env: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
            scratch_root: None,
        }
    }

    /// Append a header search directory. Earlier directories win.
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    /// Append several header search directories.
    pub fn with_include_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Append an extra compiler flag. A flag already present is ignored.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        let flag = flag.into();
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        self
    }

    /// Append several extra compiler flags.
    pub fn with_flags<I, S>(self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        flags.into_iter().fold(self, |ctx, flag| ctx.with_flag(flag))
    }

    /// Set a variable in the toolchain's otherwise empty environment.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory under which per-probe scratch directories are created.
    ///
    /// When unset the system temporary directory (`TMPDIR`) is used.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn toolchain(&self) -> &Path {
        &self.toolchain
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn scratch_root(&self) -> Option<&Path> {
        self.scratch_root.as_deref()
    }

    /// Find a required header in the search path.
    ///
    /// Returns the first `<dir>/<header>` that is a regular file.
    pub fn resolve_header(&self, header: &str) -> Option<PathBuf> {
        self.include_dirs
            .iter()
            .map(|dir| dir.join(header))
            .find(|candidate| candidate.is_file())
    }

    /// Stable identity of the fields that can change a probe's answer.
    ///
    /// Timeout and scratch location do not participate.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"toolchain\0");
        hasher.update(self.toolchain.to_string_lossy().as_bytes());
        for dir in &self.include_dirs {
            hasher.update(b"\0include\0");
            hasher.update(dir.to_string_lossy().as_bytes());
        }
        for flag in &self.flags {
            hasher.update(b"\0flag\0");
            hasher.update(flag.as_bytes());
        }
        for (key, value) in &self.env {
            hasher.update(b"\0env\0");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}
