//! Probe units: definitions, the translation-unit template and built-ins.
//!
//! A probe is a minimal compilation unit that exercises exactly one API call
//! shape. Only its compile (or link) outcome is observed; it is never run.

pub mod builtin;
pub mod definition;
pub mod template;

pub use definition::{validate_probe_name, ProbeBuilder, ProbeDefinition};
pub use template::{render_unit, source_file_name};
