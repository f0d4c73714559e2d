//! Persisted probe results.
//!
//! The [`ResultStore`] is the only channel through which the rest of a build
//! learns capability facts. It renders to a line-oriented artifact that is
//! byte-identical for identical contents.

pub mod format;
pub mod header;
pub mod results;

pub use header::macro_name;
pub use results::ResultStore;
