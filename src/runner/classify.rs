//! Turning a finished toolchain run into a classification.

use std::time::Duration;

use crate::probe::template::{source_file_name, symbol_lines};
use crate::probe::ProbeDefinition;
use crate::result::ProbeResult;
use crate::toolchain::diagnostics::{self, Attribution, Diagnostic};
use crate::toolchain::{CommandResult, Termination};

/// Maximum number of diagnostic lines kept in a result.
const MAX_DIAGNOSTIC_LINES: usize = 8;

/// Classify the outcome of compiling `unit`, the rendered form of `def`.
pub fn classify(
    def: &ProbeDefinition,
    unit: &str,
    run: &CommandResult,
    timeout: Duration,
) -> ProbeResult {
    let name = def.name();

    match run.termination {
        Termination::TimedOut => {
            return ProbeResult::indeterminate(
                name,
                None,
                format!("toolchain timed out after {}", format_timeout(timeout)),
            );
        }
        Termination::Cancelled => return ProbeResult::indeterminate(name, None, "cancelled"),
        Termination::Signaled => {
            return ProbeResult::indeterminate(
                name,
                None,
                with_tail("toolchain killed by signal", &run.output()),
            );
        }
        Termination::Exited => {}
    }

    if run.success {
        return ProbeResult::supported(name);
    }

    let code = run.exit_code;
    let status = code.map_or_else(|| "unknown".to_string(), |c| c.to_string());
    let output = run.output();
    let errors: Vec<Diagnostic> = diagnostics::parse(&output)
        .into_iter()
        .filter(Diagnostic::is_error)
        .collect();

    if errors.is_empty() {
        return ProbeResult::indeterminate(
            name,
            code,
            with_tail(
                &format!("toolchain exited with status {} without error diagnostics", status),
                &output,
            ),
        );
    }

    let source_file = source_file_name(def);
    let lines = def
        .symbol()
        .map(|symbol| symbol_lines(unit, symbol))
        .unwrap_or_default();
    let attribution = Attribution {
        source_file: &source_file,
        symbol: def.symbol(),
        symbol_lines: &lines,
    };

    let (blamed, unrelated): (Vec<&Diagnostic>, Vec<&Diagnostic>) =
        errors.iter().partition(|d| attribution.is_attributable(d));

    if unrelated.is_empty() {
        ProbeResult::unsupported(name, code, condense(&blamed))
    } else {
        ProbeResult::indeterminate(
            name,
            code,
            format!("unrelated toolchain error:\n{}", condense(&unrelated)),
        )
    }
}

/// Join diagnostic lines, keeping at most [`MAX_DIAGNOSTIC_LINES`].
fn condense(diags: &[&Diagnostic]) -> String {
    let mut lines: Vec<String> = diags
        .iter()
        .take(MAX_DIAGNOSTIC_LINES)
        .map(|d| d.raw.clone())
        .collect();
    let more = diags.len().saturating_sub(MAX_DIAGNOSTIC_LINES);
    if more > 0 {
        lines.push(format!("... ({} more)", more));
    }
    lines.join("\n")
}

/// Append the last non-empty output line to `reason`, if there is one.
fn with_tail(reason: &str, output: &str) -> String {
    match output.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
        Some(last) => format!("{}: {}", reason, last),
        None => reason.to_string(),
    }
}

fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}
