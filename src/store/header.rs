//! C configuration header rendered from a result store.

use std::collections::BTreeMap;

use super::results::ResultStore;
use crate::error::{ConftestError, Result};

/// Macro name for a probe: `HAVE_` followed by the upper-cased name.
pub fn macro_name(probe: &str) -> String {
    let mut name = String::from("HAVE_");
    name.extend(probe.chars().map(|c| match c {
        '.' | '-' => '_',
        c => c.to_ascii_uppercase(),
    }));
    name
}

impl ResultStore {
    /// Render a header defining one macro per supported capability.
    ///
    /// Refuses to render while any result is indeterminate, or when two
    /// probe names map to one macro: consumers must never see a guess.
    pub fn config_header(&self) -> Result<String> {
        self.ensure_determinate()?;

        let mut owners: BTreeMap<String, String> = BTreeMap::new();
        for result in self.results() {
            let name = macro_name(result.probe_name());
            if let Some(first) = owners.insert(name.clone(), result.probe_name().to_string()) {
                return Err(ConftestError::MacroCollision {
                    macro_name: name,
                    first,
                    second: result.probe_name().to_string(),
                });
            }
        }

        let mut out = String::from("/* Generated by kconftest. Do not edit. */\n");
        for result in self.results() {
            let name = macro_name(result.probe_name());
            if result.classification().as_capability() == Some(true) {
                out.push_str(&format!("#define {} 1\n", name));
            } else {
                out.push_str(&format!("/* #undef {} */\n", name));
            }
        }
        Ok(out)
    }
}
