//! Probe catalogs.
//!
//! Probes can be declared in a YAML catalog ([`load_catalog`]) or laid out
//! one directory per probe ([`load_conftest_dir`]).
//!
//! # Example
//!
//! ```
//! use kconftest::config::load_catalog;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("probes.yml");
//! fs::write(
//!     &path,
//!     "probes:\n  rdma_create_id_net:\n    symbol: rdma_create_id\n    headers: [rdma/rdma_cm.h]\n    source: int x;\n",
//! )
//! .unwrap();
//!
//! let catalog = load_catalog(&path).unwrap();
//! assert_eq!(catalog.probes[0].name(), "rdma_create_id_net");
//! assert!(catalog.context.is_none());
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_catalog, load_conftest_dir, parse_catalog, Catalog};
pub use schema::{CatalogFile, ContextConfig, ProbeConfig};
