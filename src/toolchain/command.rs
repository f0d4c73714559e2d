//! Toolchain command execution with a deadline and cancellation.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::platform::{isolate_process_group, kill_process_tree};

/// How often a running child is polled for exit, deadline and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shared flag that aborts in-flight toolchain runs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every run holding a clone of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How the child process came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited on its own with a status code.
    Exited,
    /// Terminated by a signal it did not raise at our request.
    Signaled,
    /// Killed because the deadline passed.
    TimedOut,
    /// Killed because the cancel token fired.
    Cancelled,
}

/// Result of executing a toolchain command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// How the process ended.
    pub termination: Termination,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Combined diagnostic output, stderr first.
    pub fn output(&self) -> String {
        let mut out = self.stderr.clone();
        if !self.stdout.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stdout);
        }
        out
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// The complete environment of the child; nothing is inherited.
    pub env: BTreeMap<String, String>,

    /// Kill the process group once this much time has passed.
    pub timeout: Option<Duration>,

    /// Kill the process group once this token is cancelled.
    pub cancel: Option<CancelToken>,
}

/// Run `program` with `args` and wait for it under the given limits.
///
/// Spawn failures are returned as `Err` so the caller can tell a missing
/// toolchain from one that ran and failed.
pub fn execute(program: &Path, args: &[OsString], options: &CommandOptions) -> io::Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.env_clear();
    cmd.envs(&options.env);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    isolate_process_group(&mut cmd);

    let mut child = cmd.spawn()?;

    let stdout_handle = child.stdout.take().map(spawn_reader);
    let stderr_handle = child.stderr.take().map(spawn_reader);

    // A timeout too large to represent as an instant means no deadline.
    let deadline = options.timeout.and_then(|t| start.checked_add(t));

    let (termination, status) = loop {
        match child.try_wait() {
            Ok(Some(status)) => break (exit_termination(&status), Some(status)),
            Ok(None) => {}
            Err(e) => {
                kill_process_tree(&mut child);
                return Err(e);
            }
        }

        if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            kill_process_tree(&mut child);
            break (Termination::Cancelled, None);
        }

        let now = Instant::now();
        if let Some(deadline) = deadline {
            if now >= deadline {
                kill_process_tree(&mut child);
                break (Termination::TimedOut, None);
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        } else {
            thread::sleep(POLL_INTERVAL);
        }
    };

    let stdout = stdout_handle.map(join_reader).unwrap_or_default();
    let stderr = stderr_handle.map(join_reader).unwrap_or_default();
    let duration = start.elapsed();

    let exit_code = status.and_then(|s| s.code());
    let success = termination == Termination::Exited && exit_code == Some(0);

    Ok(CommandResult {
        exit_code,
        stdout,
        stderr,
        duration,
        termination,
        success,
    })
}

fn exit_termination(status: &ExitStatus) -> Termination {
    if status.code().is_some() {
        Termination::Exited
    } else {
        Termination::Signaled
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}
