//! Probe definitions.
//!
//! A [`ProbeDefinition`] is one capability question: a snippet that calls a
//! single API with a candidate argument list, plus the headers it needs.
//! Definitions are immutable once built; they are retired by deleting them.

use crate::error::{ConftestError, Result};

/// A single compile-time capability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeDefinition {
    pub(super) name: String,
    pub(super) source: String,
    pub(super) headers: Vec<String>,
    pub(super) link_required: bool,
    pub(super) symbol: Option<String>,
}

impl ProbeDefinition {
    /// Start building a definition with the given name and body.
    pub fn builder(name: impl Into<String>, source: impl Into<String>) -> ProbeBuilder {
        ProbeBuilder {
            name: name.into(),
            source: source.into(),
            headers: Vec::new(),
            link_required: false,
            symbol: None,
        }
    }

    /// Unique probe identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Probe body, without the header preamble.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Required headers, in include order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Whether the probe must also link, not just compile.
    pub fn link_required(&self) -> bool {
        self.link_required
    }

    /// The API whose shape is under test, if declared.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }
}

/// Builder for [`ProbeDefinition`].
#[derive(Debug, Clone)]
pub struct ProbeBuilder {
    name: String,
    source: String,
    headers: Vec<String>,
    link_required: bool,
    symbol: Option<String>,
}

impl ProbeBuilder {
    /// Append a required header (e.g. `rdma/rdma_cm.h`).
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(header.into());
        self
    }

    /// Append several required headers.
    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers.extend(headers.into_iter().map(Into::into));
        self
    }

    /// Require a successful link as well as a compile.
    pub fn link_required(mut self, link: bool) -> Self {
        self.link_required = link;
        self
    }

    /// Name the API whose shape is under test.
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Validate and freeze the definition.
    pub fn build(self) -> Result<ProbeDefinition> {
        validate_probe_name(&self.name).map_err(|message| ConftestError::InvalidDefinition {
            name: self.name.clone(),
            message,
        })?;

        let invalid = |message: String| ConftestError::InvalidDefinition {
            name: self.name.clone(),
            message,
        };

        if self.source.trim().is_empty() {
            return Err(invalid("source is empty".to_string()));
        }

        for header in &self.headers {
            if header.trim().is_empty() {
                return Err(invalid("header path is empty".to_string()));
            }
            if header.starts_with('/') {
                return Err(invalid(format!(
                    "header '{}' must be relative to an include directory",
                    header
                )));
            }
            if header.split('/').any(|part| part == "..") {
                return Err(invalid(format!("header '{}' escapes the include tree", header)));
            }
        }

        if let Some(symbol) = &self.symbol {
            let valid = !symbol.is_empty()
                && symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(invalid(format!("symbol '{}' is not a C identifier", symbol)));
            }
        }

        Ok(ProbeDefinition {
            name: self.name,
            source: self.source,
            headers: self.headers,
            link_required: self.link_required,
            symbol: self.symbol,
        })
    }
}

/// Check that a probe name is usable as a store key and a file stem.
///
/// Names are non-empty and consist of ASCII letters, digits, `_`, `.` and `-`.
pub fn validate_probe_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name.starts_with('.') || name.starts_with('-') {
        return Err(format!("name '{}' must start with a letter, digit or '_'", name));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(format!("name '{}' contains invalid character {:?}", name, bad));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_definition() {
        let def = ProbeDefinition::builder("demo", "int x;")
            .header("linux/module.h")
            .headers(["rdma/rdma_cm.h"])
            .symbol("rdma_create_id")
            .build()
            .unwrap();

        assert_eq!(def.name(), "demo");
        assert_eq!(def.source(), "int x;");
        assert_eq!(def.headers(), ["linux/module.h", "rdma/rdma_cm.h"]);
        assert!(!def.link_required());
        assert_eq!(def.symbol(), Some("rdma_create_id"));
    }

    #[test]
    fn empty_source_rejected() {
        let err = ProbeDefinition::builder("demo", "  \n").build().unwrap_err();
        assert!(err.to_string().contains("source is empty"));
    }

    #[test]
    fn whitespace_in_name_rejected() {
        let err = ProbeDefinition::builder("has space", "int x;")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConftestError::InvalidDefinition { .. }));
    }

    #[test]
    fn absolute_header_rejected() {
        let err = ProbeDefinition::builder("demo", "int x;")
            .header("/usr/include/stdio.h")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("relative"));
    }

    #[test]
    fn parent_dir_header_rejected() {
        let err = ProbeDefinition::builder("demo", "int x;")
            .header("../secret.h")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("escapes"));
    }

    #[test]
    fn symbol_must_be_identifier() {
        let err = ProbeDefinition::builder("demo", "int x;")
            .symbol("rdma create")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("C identifier"));
    }

    #[test]
    fn probe_name_rules() {
        assert!(validate_probe_name("rdma_create_id_net").is_ok());
        assert!(validate_probe_name("ib.query-gid_2").is_ok());
        assert!(validate_probe_name("").is_err());
        assert!(validate_probe_name("-flag").is_err());
        assert!(validate_probe_name("a/b").is_err());
        assert!(validate_probe_name("tab\tname").is_err());
    }
}
