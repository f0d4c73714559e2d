//! kconftest - compile-time capability probes for kernel module builds.
//!
//! An out-of-tree module that must build against many kernel versions cannot
//! know in advance which shape an in-kernel API has. kconftest answers those
//! questions by compiling a tiny probe per question against the target
//! headers and recording whether it compiled.
//!
//! # Modules
//!
//! - [`probe`] - Probe definitions and translation-unit rendering
//! - [`context`] - Toolchain and header configuration
//! - [`runner`] - Running and classifying probes
//! - [`store`] - Recorded results and the persisted artifact
//! - [`cache`] - Reusing results across builds
//! - [`config`] - YAML catalogs and conftest directories
//! - [`toolchain`] - Process execution and diagnostic parsing
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```
//! use kconftest::{run_probe, BuildContext, Classification, ProbeDefinition, ResultStore};
//!
//! let probe = ProbeDefinition::builder("demo", "int x;").build().unwrap();
//! let ctx = BuildContext::new("/nonexistent/cc");
//!
//! let store = ResultStore::new();
//! store.record(run_probe(&probe, &ctx)).unwrap();
//!
//! let result = store.lookup("demo").unwrap();
//! assert_eq!(result.classification(), Classification::Indeterminate);
//! assert!(store.capability("demo").is_err());
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod probe;
pub mod result;
pub mod runner;
pub mod store;
pub mod toolchain;

pub use context::BuildContext;
pub use error::{ConftestError, Result};
pub use probe::ProbeDefinition;
pub use result::{Classification, ProbeResult};
pub use runner::{run_all, run_probe, ProbeRunner, RunOptions};
pub use store::ResultStore;
