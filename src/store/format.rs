//! Line format of the persisted result artifact.
//!
//! ```text
//! # kconftest results v1
//! # context 3f2a...
//! rdma_create_id_net SUPPORTED 0
//! ib_query_gid_attr UNSUPPORTED 1 ib_query_gid_attr.c:5:9: error: ...
//! ```
//!
//! Each record is `<name> <CLASSIFICATION> <exit|-> [diagnostic]`. The
//! diagnostic is escaped so that it never spans more than one line.

use crate::probe::validate_probe_name;
use crate::result::{Classification, ProbeResult};

/// First line of every artifact.
pub const HEADER: &str = "# kconftest results v1";

/// Prefix of the optional context fingerprint line.
pub const CONTEXT_PREFIX: &str = "# context ";

/// Render one record without a trailing newline.
pub fn render_record(result: &ProbeResult) -> String {
    let exit = result
        .raw_exit_code()
        .map_or_else(|| "-".to_string(), |code| code.to_string());
    let mut line = format!("{} {} {}", result.probe_name(), result.classification(), exit);
    if let Some(diag) = result.diagnostic_text() {
        line.push(' ');
        line.push_str(&escape(diag));
    }
    line
}

/// Parse one record line. The error is a human-readable reason.
pub fn parse_record(line: &str) -> Result<ProbeResult, String> {
    let mut fields = line.splitn(4, ' ');

    let name = fields.next().unwrap_or_default();
    validate_probe_name(name)?;

    let class: Classification = fields
        .next()
        .ok_or_else(|| "missing classification".to_string())?
        .parse()?;

    let exit = fields.next().ok_or_else(|| "missing exit code".to_string())?;
    let exit = match exit {
        "-" => None,
        code => Some(
            code.parse::<i32>()
                .map_err(|_| format!("invalid exit code '{}'", code))?,
        ),
    };

    let diagnostic = fields.next().map(unescape).transpose()?;

    Ok(ProbeResult::new(name, class, exit, diagnostic))
}

/// Escape backslashes and line breaks.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`]. Unknown escapes are an error.
pub fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => return Err(format!("invalid escape '\\{}'", other)),
            None => return Err("dangling '\\' at end of line".to_string()),
        }
    }
    Ok(out)
}
