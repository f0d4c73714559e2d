//! Toolchain process execution and diagnostic parsing.

pub mod command;
pub mod diagnostics;
pub mod invocation;
pub mod platform;

pub use command::{execute, CancelToken, CommandOptions, CommandResult, Termination};
pub use diagnostics::{Attribution, Diagnostic, Severity};
pub use invocation::driver_args;
pub use platform::is_executable;
