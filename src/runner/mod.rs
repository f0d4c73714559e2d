//! Probe execution.
//!
//! [`ProbeRunner`] compiles one probe in an isolated scratch directory and
//! classifies the outcome; [`run_all`] drains a batch of probes in parallel.

pub mod batch;
pub mod classify;
pub mod executor;
pub mod state;

pub use batch::{run_all, RunOptions};
pub use executor::{run_probe, ProbeRunner};
pub use state::{ProbeState, RunTracker};
