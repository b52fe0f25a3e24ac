//! Datashed: Filesystem-Backed Metadata Catalog
//!
//! A hierarchical catalog for experimental datasets: a catalog root owns
//! collections, collections own records, and a single JSON index document
//! persists the whole hierarchy alongside the actual files. The index is
//! rewritten on every mutation and reconciled against the filesystem when a
//! catalog is opened, so it always reflects what is really on disk.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod confirm;
pub mod content;
pub mod error;
pub mod index;
pub mod logging;
pub mod naming;
pub mod query;
pub mod tooling;

pub use catalog::{Catalog, Collection, MetricOptions, Record};
pub use confirm::{ConfirmPolicy, DeleteOutcome};
pub use content::{ArraySlab, ElementType};
pub use error::CatalogError;
