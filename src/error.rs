//! Error types for probe operations.
//!
//! This module defines [`ConftestError`], the error type used throughout the
//! crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - A compile failure caused by the exercised call is not an error: it is
//!   the `UNSUPPORTED` answer and stays inside the runner.
//! - A broken environment surfaces as [`ConftestError::EnvironmentFailure`]
//!   once a caller asks for a capability that could not be determined.
//! - A malformed result artifact is [`ConftestError::StoreCorruption`] and
//!   is never defaulted to a classification.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for probe operations.
#[derive(Debug, Error)]
pub enum ConftestError {
    /// The toolchain or header tree could not answer the probe.
    #[error("Environment failure in probe '{probe}': {reason}")]
    EnvironmentFailure { probe: String, reason: String },

    /// A persisted result record could not be parsed.
    #[error("Corrupt result store at line {line} ({content:?}): {reason}")]
    StoreCorruption {
        line: usize,
        content: String,
        reason: String,
    },

    /// No result has been recorded for the probe.
    #[error("No result recorded for probe '{probe}'")]
    NotFound { probe: String },

    /// Two definitions share one name in a batch or catalog.
    #[error("Duplicate probe definition: {name}")]
    DuplicateProbe { name: String },

    /// Two probe names map to the same configuration macro.
    #[error("Probes '{first}' and '{second}' both map to macro {macro_name}")]
    MacroCollision {
        macro_name: String,
        first: String,
        second: String,
    },

    /// A probe definition violates the authoring convention.
    #[error("Invalid probe '{name}': {message}")]
    InvalidDefinition { name: String, message: String },

    /// Catalog file not found at the given location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a catalog file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Catalog parsed but its values are unusable.
    #[error("Invalid configuration: {message}")]
    ConfigValidation { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConftestError {
    /// Whether the error means the build environment needs human attention.
    pub fn is_environment(&self) -> bool {
        matches!(self, ConftestError::EnvironmentFailure { .. })
    }
}

/// Result type alias for probe operations.
pub type Result<T> = std::result::Result<T, ConftestError>;
