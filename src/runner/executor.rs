//! Running one probe against one build context.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::classify::classify;
use super::state::{ProbeState, RunTracker};
use crate::context::BuildContext;
use crate::probe::{render_unit, source_file_name, ProbeDefinition};
use crate::result::{Classification, ProbeResult};
use crate::toolchain::{driver_args, execute, is_executable, CancelToken, CommandOptions};

/// Runs probes against a fixed build context.
///
/// Every run gets its own scratch directory, removed when the run ends
/// whatever the outcome. Nothing is retried.
#[derive(Debug, Clone)]
pub struct ProbeRunner<'a> {
    ctx: &'a BuildContext,
    cancel: Option<CancelToken>,
}

impl<'a> ProbeRunner<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Self { ctx, cancel: None }
    }

    /// Abort in-flight toolchain runs when `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn context(&self) -> &BuildContext {
        self.ctx
    }

    /// Compile `def` and classify the outcome.
    pub fn run(&self, def: &ProbeDefinition) -> ProbeResult {
        let mut tracker = RunTracker::new(def.name());
        let result = self.run_tracked(def, &mut tracker);

        match result.classification() {
            Classification::Indeterminate => tracing::warn!(
                probe = def.name(),
                "indeterminate: {}",
                result.diagnostic_text().unwrap_or_default()
            ),
            class => tracing::info!(probe = def.name(), "{}", class),
        }
        result
    }

    fn run_tracked(&self, def: &ProbeDefinition, tracker: &mut RunTracker<'_>) -> ProbeResult {
        if let Err(reason) = self.preflight(def) {
            return finish(tracker, ProbeResult::indeterminate(def.name(), None, reason));
        }

        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return finish(tracker, ProbeResult::indeterminate(def.name(), None, "cancelled"));
        }

        let scratch = match self.scratch_dir(def) {
            Ok(dir) => dir,
            Err(e) => {
                return finish(
                    tracker,
                    ProbeResult::indeterminate(
                        def.name(),
                        None,
                        format!("cannot create scratch directory: {}", e),
                    ),
                );
            }
        };

        let unit = render_unit(def);
        let source_file = source_file_name(def);
        if let Err(e) = fs::write(scratch.path().join(&source_file), &unit) {
            return finish(
                tracker,
                ProbeResult::indeterminate(
                    def.name(),
                    None,
                    format!("cannot write probe source: {}", e),
                ),
            );
        }

        tracker.advance(ProbeState::Compiling);

        let toolchain = absolute(self.ctx.toolchain());
        let args = driver_args(def, self.ctx, &source_file);
        tracing::debug!(
            probe = def.name(),
            "{} {}",
            toolchain.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let options = CommandOptions {
            cwd: Some(scratch.path().to_path_buf()),
            env: self.child_env(),
            timeout: Some(self.ctx.timeout()),
            cancel: self.cancel.clone(),
        };

        let result = match execute(&toolchain, &args, &options) {
            Ok(run) => classify(def, &unit, &run, self.ctx.timeout()),
            Err(e) => ProbeResult::indeterminate(def.name(), None, spawn_failure(&toolchain, &e)),
        };

        if let Err(e) = scratch.close() {
            tracing::warn!(probe = def.name(), "failed to remove scratch directory: {}", e);
        }

        finish(tracker, result)
    }

    /// Checks that must pass before the toolchain is worth starting.
    fn preflight(&self, def: &ProbeDefinition) -> Result<(), String> {
        let toolchain = self.ctx.toolchain();
        if !toolchain.exists() {
            return Err(format!("toolchain not found: {}", toolchain.display()));
        }
        if !is_executable(toolchain) {
            return Err(format!("toolchain not executable: {}", toolchain.display()));
        }

        for header in def.headers() {
            if self.ctx.resolve_header(header).is_none() {
                return Err(format!(
                    "required header not found: {} (searched {} include directories)",
                    header,
                    self.ctx.include_dirs().len()
                ));
            }
        }
        Ok(())
    }

    /// Without a scratch root the system temporary directory is used, which
    /// honours `TMPDIR`. That is the only environment variable consulted; set
    /// a scratch root to make runs independent of it.
    fn scratch_dir(&self, def: &ProbeDefinition) -> io::Result<TempDir> {
        let prefix = format!("kconftest-{}-", def.name());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        match self.ctx.scratch_root() {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
    }

    /// `LC_ALL=C` keeps diagnostics in English; the context may override it.
    fn child_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("LC_ALL".to_string(), "C".to_string());
        env.extend(
            self.ctx
                .env()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        env
    }
}

fn finish(tracker: &mut RunTracker<'_>, result: ProbeResult) -> ProbeResult {
    tracker.advance(ProbeState::Finished(result.classification()));
    result
}

/// Run one probe against `ctx`.
pub fn run_probe(def: &ProbeDefinition, ctx: &BuildContext) -> ProbeResult {
    ProbeRunner::new(ctx).run(def)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn spawn_failure(toolchain: &Path, err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => format!("toolchain not found: {}", toolchain.display()),
        io::ErrorKind::PermissionDenied => {
            format!("toolchain not executable: {}", toolchain.display())
        }
        _ => format!("failed to start toolchain {}: {}", toolchain.display(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::builtin::rdma_create_id_net;
    use tempfile::TempDir;

    #[test]
    fn missing_toolchain_is_indeterminate() {
        let temp = TempDir::new().unwrap();
        let ctx = BuildContext::new(temp.path().join("no-such-cc")).with_scratch_root(temp.path());

        let result = run_probe(&rdma_create_id_net(), &ctx);

        assert_eq!(result.classification(), Classification::Indeterminate);
        assert!(result
            .diagnostic_text()
            .unwrap()
            .starts_with("toolchain not found"));
        assert_eq!(result.raw_exit_code(), None);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_toolchain_is_indeterminate() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let cc = temp.path().join("cc");
        fs::write(&cc, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&cc, fs::Permissions::from_mode(0o644)).unwrap();

        let result = run_probe(&rdma_create_id_net(), &BuildContext::new(&cc));

        assert_eq!(result.classification(), Classification::Indeterminate);
        assert!(result.diagnostic_text().unwrap().contains("not executable"));
    }

    #[cfg(unix)]
    #[test]
    fn missing_header_short_circuits_before_compiling() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let cc = temp.path().join("cc");
        let marker = temp.path().join("ran");
        fs::write(&cc, format!("#!/bin/sh\ntouch {}\nexit 0\n", marker.display())).unwrap();
        fs::set_permissions(&cc, fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = BuildContext::new(&cc).with_include_dir(temp.path().join("include"));
        let result = run_probe(&rdma_create_id_net(), &ctx);

        assert_eq!(result.classification(), Classification::Indeterminate);
        assert!(result
            .diagnostic_text()
            .unwrap()
            .contains("required header not found: linux/module.h"));
        assert!(!marker.exists());
    }

    #[test]
    fn cancelled_runner_does_not_start() {
        let temp = TempDir::new().unwrap();
        let token = CancelToken::new();
        token.cancel();

        let def = ProbeDefinition::builder("plain", "int x;").build().unwrap();
        let cc = std::env::current_exe().unwrap();
        let ctx = BuildContext::new(cc).with_scratch_root(temp.path());
        let result = ProbeRunner::new(&ctx).with_cancel(token).run(&def);

        assert_eq!(result.classification(), Classification::Indeterminate);
        assert_eq!(result.diagnostic_text(), Some("cancelled"));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn scratch_dir_lives_under_scratch_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("scratch");
        let ctx = BuildContext::new("cc").with_scratch_root(&root);
        let def = ProbeDefinition::builder("plain", "int x;").build().unwrap();

        let dir = ProbeRunner::new(&ctx).scratch_dir(&def).unwrap();

        assert_eq!(dir.path().parent(), Some(root.as_path()));
        let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("kconftest-plain-"), "{name}");

        let path = dir.path().to_path_buf();
        dir.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn spawn_failure_messages() {
        let path = Path::new("/opt/cc");
        let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(spawn_failure(path, &not_found), "toolchain not found: /opt/cc");
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "no");
        assert_eq!(spawn_failure(path, &denied), "toolchain not executable: /opt/cc");
    }

    #[test]
    fn child_env_defaults_to_c_locale() {
        let ctx = BuildContext::new("cc").with_env("PATH", "/usr/bin");
        let runner = ProbeRunner::new(&ctx);
        let env = runner.child_env();
        assert_eq!(env.get("LC_ALL").map(String::as_str), Some("C"));
        assert_eq!(env.get("PATH").map(String::as_str), Some("/usr/bin"));

        let overridden = BuildContext::new("cc").with_env("LC_ALL", "POSIX");
        let env = ProbeRunner::new(&overridden).child_env();
        assert_eq!(env.get("LC_ALL").map(String::as_str), Some("POSIX"));
    }
}
