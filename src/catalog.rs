//! Catalog domain: the in-memory hierarchy and its lifecycle.
//!
//! A [`Catalog`] owns an ordered set of [`Collection`]s, each owning an
//! ordered set of [`Record`]s. Every object holds a handle to the shared
//! index store and its own ordinal position; mutations update the in-memory
//! tree first, then rewrite the index document to disk before returning.

mod collection;
mod record;
mod root;

pub use collection::{Collection, MetricOptions};
pub use record::Record;
pub use root::Catalog;

/// Directory under a catalog root holding all collection directories.
pub const COLLECTIONS_DIR: &str = "Collections";

/// Directory inside each collection reserved for visualization output.
pub const VISUALIZATION_DIR: &str = "visualization";

/// Extension of record content files.
pub const CONTENT_EXT: &str = "dat";
