//! Compiler and linker diagnostic parsing.
//!
//! Understands the GCC/Clang `file:line[:col]: severity: message` form, the
//! tool-prefixed form (`cc1: error: ...`) and GNU ld's `undefined reference`
//! lines. Anything else in the output is ignored.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::probe::template::mentions_identifier;

macro_rules! lazy_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("diagnostic regex must compile"));
    };
}

lazy_regex!(
    RE_LOCATED,
    r"^(?P<file>[^:\s][^:]*):(?P<line>\d+):(?:(?P<col>\d+):)?\s*(?P<sev>fatal error|error|warning|note):\s*(?P<msg>.*)$"
);
lazy_regex!(
    RE_TOOL,
    r"^(?P<tool>[^:\s]+):\s*(?P<sev>fatal error|error|warning|note):\s*(?P<msg>.*)$"
);
lazy_regex!(
    RE_UNDEFINED_REF,
    r"undefined reference to [`'‘](?P<sym>[^'’`]+)['’]"
);
lazy_regex!(
    RE_LINK_SITE,
    r"(?:^|\s)(?P<file>[^\s:()]+):\([^)]*\):\s*undefined reference"
);
lazy_regex!(
    RE_SUMMARY,
    r"ld returned \d+ exit status|linker command failed|^\d+ errors? generated\.?$|^compilation terminated\.$"
);

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Note,
}

impl Severity {
    fn parse(s: &str) -> Self {
        match s {
            "fatal error" => Severity::Fatal,
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            _ => Severity::Note,
        }
    }
}

/// One parsed diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Source file the diagnostic points at, if any.
    pub file: Option<String>,
    /// 1-based line in `file`.
    pub line: Option<usize>,
    pub severity: Severity,
    pub message: String,
    /// The line as the toolchain printed it.
    pub raw: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Fatal)
    }
}

/// Parse toolchain output into diagnostics, dropping driver summary lines.
pub fn parse(output: &str) -> Vec<Diagnostic> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<Diagnostic> {
    let trimmed = line.trim();
    if trimmed.is_empty() || RE_SUMMARY.is_match(trimmed) {
        return None;
    }

    if let Some(caps) = RE_UNDEFINED_REF.captures(trimmed) {
        // GNU ld names the referencing source file: `probe.c:(.text+0x5): ...`.
        let file = RE_LINK_SITE
            .captures(trimmed)
            .map(|site| site["file"].to_string());
        return Some(Diagnostic {
            file,
            line: None,
            severity: Severity::Error,
            message: format!("undefined reference to '{}'", &caps["sym"]),
            raw: trimmed.to_string(),
        });
    }

    if let Some(caps) = RE_LOCATED.captures(trimmed) {
        return Some(Diagnostic {
            file: Some(caps["file"].to_string()),
            line: caps["line"].parse().ok(),
            severity: Severity::parse(&caps["sev"]),
            message: caps["msg"].to_string(),
            raw: trimmed.to_string(),
        });
    }

    RE_TOOL.captures(trimmed).map(|caps| Diagnostic {
        file: None,
        line: None,
        severity: Severity::parse(&caps["sev"]),
        message: caps["msg"].to_string(),
        raw: trimmed.to_string(),
    })
}

/// What a diagnostic must look like to be blamed on the exercised call.
#[derive(Debug, Clone)]
pub struct Attribution<'a> {
    /// File name of the probe's translation unit.
    pub source_file: &'a str,
    /// The API under test, if declared.
    pub symbol: Option<&'a str>,
    /// Lines of the translation unit that mention `symbol`.
    pub symbol_lines: &'a [usize],
}

impl Attribution<'_> {
    /// Whether `diag` is an error caused by the exercised call.
    ///
    /// Fatal errors (missing headers, driver failures) are never attributable.
    /// An error counts when it names the symbol, or when it points into the
    /// probe's own file on a line that uses the symbol. Without a declared
    /// symbol any error located in the probe's file counts.
    pub fn is_attributable(&self, diag: &Diagnostic) -> bool {
        if diag.severity != Severity::Error {
            return false;
        }

        if let Some(symbol) = self.symbol {
            if mentions_identifier(&diag.message, symbol) {
                return true;
            }
        }

        let in_probe_file = diag
            .file
            .as_deref()
            .and_then(|f| Path::new(f).file_name())
            .is_some_and(|name| name == self.source_file);
        if !in_probe_file {
            return false;
        }

        match (self.symbol, diag.line) {
            (None, _) => true,
            (Some(_), Some(line)) => self.symbol_lines.contains(&line),
            (Some(_), None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GCC_ARITY: &str = "\
rdma_create_id_net.c: In function 'modinit':
rdma_create_id_net.c:6:16: error: too many arguments to function 'rdma_create_id'
    6 |         return rdma_create_id(NULL, NULL, NULL, 0, 0) != NULL;
      |                ^~~~~~~~~~~~~~
In file included from rdma_create_id_net.c:2:
include/rdma/rdma_cm.h:10:21: note: declared here
";

    const CLANG_ARITY: &str = "\
rdma_create_id_net.c:6:45: error: too many arguments to function call, expected 4, have 5
        return rdma_create_id(NULL, NULL, NULL, 0, 0) != NULL;
               ~~~~~~~~~~~~~~                   ^
1 error generated.
";

    const MISSING_HEADER: &str = "\
rdma_create_id_net.c:2:10: fatal error: rdma/rdma_cm.h: No such file or directory
    2 | #include <rdma/rdma_cm.h>
compilation terminated.
";

    const LD_UNDEFINED: &str = "\
/usr/bin/ld: /tmp/ccX.o: in function `main':
probe.c:(.text+0x5): undefined reference to `ib_foo'
collect2: error: ld returned 1 exit status
";

    fn attribution<'a>(lines: &'a [usize], symbol: Option<&'a str>) -> Attribution<'a> {
        Attribution {
            source_file: "rdma_create_id_net.c",
            symbol,
            symbol_lines: lines,
        }
    }

    #[test]
    fn parses_gcc_located_error_and_note() {
        let diags = parse(GCC_ARITY);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].file.as_deref(), Some("rdma_create_id_net.c"));
        assert_eq!(diags[0].line, Some(6));
        assert!(diags[0].message.contains("too many arguments"));
        assert_eq!(diags[1].severity, Severity::Note);
    }

    #[test]
    fn gcc_arity_error_is_attributable() {
        let lines = [6];
        let attr = attribution(&lines, Some("rdma_create_id"));
        let diags = parse(GCC_ARITY);
        assert!(attr.is_attributable(&diags[0]));
        assert!(!attr.is_attributable(&diags[1]));
    }

    #[test]
    fn clang_error_is_attributed_by_location() {
        let lines = [6];
        let attr = attribution(&lines, Some("rdma_create_id"));
        let diags = parse(CLANG_ARITY);
        assert_eq!(diags.len(), 1);
        assert!(!diags[0].message.contains("rdma_create_id"));
        assert!(attr.is_attributable(&diags[0]));
    }

    #[test]
    fn error_on_other_line_is_not_attributable() {
        let lines = [9];
        let attr = attribution(&lines, Some("rdma_create_id"));
        let diags = parse(CLANG_ARITY);
        assert!(!attr.is_attributable(&diags[0]));
    }

    #[test]
    fn fatal_missing_header_is_not_attributable() {
        let attr = attribution(&[], None);
        let diags = parse(MISSING_HEADER);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Fatal);
        assert!(!attr.is_attributable(&diags[0]));
    }

    #[test]
    fn undefined_reference_names_symbol() {
        let diags = parse(LD_UNDEFINED);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined reference to 'ib_foo'");
        assert_eq!(diags[0].file.as_deref(), Some("probe.c"));
        assert_eq!(diags[0].line, None);

        let attr = attribution(&[], Some("ib_foo"));
        assert!(attr.is_attributable(&diags[0]));

        let other = attribution(&[], Some("ib_bar"));
        assert!(!other.is_attributable(&diags[0]));
    }

    #[test]
    fn undefined_reference_in_own_file_counts_without_symbol() {
        let output = "\
/usr/bin/ld: /tmp/ccX.o: in function `main':
/usr/bin/ld: rdma_create_id_net.c:(.text+0x5): undefined reference to `missing_export'
collect2: error: ld returned 1 exit status
";
        let diags = parse(output);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].file.as_deref(), Some("rdma_create_id_net.c"));
        assert!(attribution(&[], None).is_attributable(&diags[0]));
    }

    #[test]
    fn undefined_reference_from_other_object_is_not_attributable() {
        let diags = parse("libfoo.a(foo.o):(.text+0x9): undefined reference to `bar'\n");
        assert_eq!(diags.len(), 1);
        assert!(!attribution(&[], None).is_attributable(&diags[0]));

        let diags = parse("undefined reference to `bar'\n");
        assert_eq!(diags[0].file, None);
        assert!(!attribution(&[], None).is_attributable(&diags[0]));
    }

    #[test]
    fn tool_level_errors_are_parsed() {
        let diags = parse("cc1: error: unrecognized command-line option '-fbogus'\n");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());
        assert_eq!(diags[0].file, None);
        assert!(!attribution(&[], None).is_attributable(&diags[0]));
    }

    #[test]
    fn without_symbol_any_error_in_probe_file_counts() {
        let attr = attribution(&[], None);
        let diags = parse(CLANG_ARITY);
        assert!(attr.is_attributable(&diags[0]));
    }

    #[test]
    fn errors_in_headers_are_not_attributable() {
        let lines = [6];
        let attr = attribution(&lines, Some("rdma_create_id"));
        let diags = parse("include/linux/kernel.h:6:1: error: unknown type name 'u64'\n");
        assert!(!attr.is_attributable(&diags[0]));
    }

    #[test]
    fn source_excerpts_are_ignored() {
        assert!(parse("    6 |         return x;\n      |                ^\n").is_empty());
    }
}
