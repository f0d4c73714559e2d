//! Translation-unit rendering.
//!
//! Probe authors write only the body; the header preamble is generated from
//! the definition so the include order is always the declared one.

use super::ProbeDefinition;

/// File name of the rendered translation unit inside a scratch directory.
pub fn source_file_name(def: &ProbeDefinition) -> String {
    format!("{}.c", def.name())
}

/// Render the complete translation unit for a probe.
pub fn render_unit(def: &ProbeDefinition) -> String {
    let mut unit = String::new();
    for header in def.headers() {
        unit.push_str("#include <");
        unit.push_str(header);
        unit.push_str(">\n");
    }
    if !def.headers().is_empty() {
        unit.push('\n');
    }
    unit.push_str(def.source());
    if !unit.ends_with('\n') {
        unit.push('\n');
    }
    unit
}

/// 1-based line numbers of `unit` that mention `symbol` as a whole word.
pub fn symbol_lines(unit: &str, symbol: &str) -> Vec<usize> {
    unit.lines()
        .enumerate()
        .filter(|(_, line)| mentions_identifier(line, symbol))
        .map(|(idx, _)| idx + 1)
        .collect()
}

/// Whether `text` contains `ident` not embedded in a longer identifier.
pub fn mentions_identifier(text: &str, ident: &str) -> bool {
    if ident.is_empty() {
        return false;
    }
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    text.match_indices(ident).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + ident.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}
