//! Probe classifications and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConftestError, Result};

/// The three-way answer a probe produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// The toolchain accepted the exercised call.
    Supported,
    /// The toolchain rejected the exercised call.
    Unsupported,
    /// The environment could not answer the question.
    Indeterminate,
}

impl Classification {
    /// Whether the result is a usable capability fact.
    pub fn is_determinate(self) -> bool {
        !matches!(self, Classification::Indeterminate)
    }

    /// The capability as a boolean, or `None` when indeterminate.
    pub fn as_capability(self) -> Option<bool> {
        match self {
            Classification::Supported => Some(true),
            Classification::Unsupported => Some(false),
            Classification::Indeterminate => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Supported => "SUPPORTED",
            Classification::Unsupported => "UNSUPPORTED",
            Classification::Indeterminate => "INDETERMINATE",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SUPPORTED" => Ok(Classification::Supported),
            "UNSUPPORTED" => Ok(Classification::Unsupported),
            "INDETERMINATE" => Ok(Classification::Indeterminate),
            other => Err(format!("unknown classification '{}'", other)),
        }
    }
}

/// Outcome of one probe run against one build context.
///
/// Results are created once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    probe_name: String,
    classification: Classification,
    raw_exit_code: Option<i32>,
    diagnostic_text: Option<String>,
}

impl ProbeResult {
    pub fn new(
        probe_name: impl Into<String>,
        classification: Classification,
        raw_exit_code: Option<i32>,
        diagnostic_text: Option<String>,
    ) -> Self {
        Self {
            probe_name: probe_name.into(),
            classification,
            raw_exit_code,
            diagnostic_text,
        }
    }

    /// The toolchain exited zero.
    pub fn supported(probe_name: impl Into<String>) -> Self {
        Self::new(probe_name, Classification::Supported, Some(0), None)
    }

    /// The toolchain rejected the exercised call.
    pub fn unsupported(
        probe_name: impl Into<String>,
        raw_exit_code: Option<i32>,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self::new(
            probe_name,
            Classification::Unsupported,
            raw_exit_code,
            Some(diagnostics.into()),
        )
    }

    /// The environment could not answer; `reason` says why.
    pub fn indeterminate(
        probe_name: impl Into<String>,
        raw_exit_code: Option<i32>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            probe_name,
            Classification::Indeterminate,
            raw_exit_code,
            Some(reason.into()),
        )
    }

    pub fn probe_name(&self) -> &str {
        &self.probe_name
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Exit code of the toolchain, `None` if it never ran or was killed.
    pub fn raw_exit_code(&self) -> Option<i32> {
        self.raw_exit_code
    }

    pub fn diagnostic_text(&self) -> Option<&str> {
        self.diagnostic_text.as_deref()
    }

    /// The capability fact, or an environment failure if there is none.
    ///
    /// An indeterminate result is never turned into `false`.
    pub fn require_determinate(&self) -> Result<bool> {
        self.classification
            .as_capability()
            .ok_or_else(|| ConftestError::EnvironmentFailure {
                probe: self.probe_name.clone(),
                reason: self
                    .diagnostic_text
                    .clone()
                    .unwrap_or_else(|| "probe could not be evaluated".to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_round_trips_through_text() {
        for class in [
            Classification::Supported,
            Classification::Unsupported,
            Classification::Indeterminate,
        ] {
            assert_eq!(class.to_string().parse::<Classification>(), Ok(class));
        }
    }

    #[test]
    fn classification_rejects_lowercase() {
        assert!("supported".parse::<Classification>().is_err());
    }

    #[test]
    fn capability_mapping() {
        assert_eq!(Classification::Supported.as_capability(), Some(true));
        assert_eq!(Classification::Unsupported.as_capability(), Some(false));
        assert_eq!(Classification::Indeterminate.as_capability(), None);
        assert!(!Classification::Indeterminate.is_determinate());
    }

    #[test]
    fn supported_result_has_zero_exit() {
        let result = ProbeResult::supported("p");
        assert_eq!(result.raw_exit_code(), Some(0));
        assert_eq!(result.diagnostic_text(), None);
        assert!(result.require_determinate().unwrap());
    }

    #[test]
    fn unsupported_is_false_not_error() {
        let result = ProbeResult::unsupported("p", Some(1), "p.c:6:9: error: too many arguments");
        assert!(!result.require_determinate().unwrap());
    }

    #[test]
    fn indeterminate_becomes_environment_failure() {
        let result = ProbeResult::indeterminate("p", None, "toolchain not found: /nope");
        let err = result.require_determinate().unwrap_err();
        assert!(err.is_environment());
        assert!(err.to_string().contains("toolchain not found"));
    }

    #[test]
    fn serializes_classification_in_caps() {
        let json = serde_json::to_string(&ProbeResult::supported("p")).unwrap();
        assert!(json.contains("\"SUPPORTED\""));
    }
}
