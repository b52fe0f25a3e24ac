//! Persisted index document.
//!
//! One JSON document per catalog describes the whole hierarchy: the catalog
//! name, creation date, and path, plus an ordered list of collection
//! descriptors, each carrying its own ordered record descriptors. Every
//! mutation anywhere in the tree rewrites the full document before the
//! operation returns, so the document on disk and the in-memory tree are
//! never observed out of step within a process.

use crate::error::CatalogError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// File name of the index document inside a catalog directory.
pub const INDEX_FILE: &str = "index.json";

/// Metadata map for every level of the hierarchy. `serde_json::Map`
/// preserves key order in the persisted document.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Descriptor of one record inside a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub name: String,
    /// Content file name relative to the collection directory.
    pub path: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Position in the owning collection's record list.
    pub index: usize,
}

/// Descriptor of one collection inside a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub name: String,
    /// Directory name relative to the catalog's `Collections` directory.
    pub path: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Position in the catalog's collection list.
    pub index: usize,
    #[serde(default)]
    pub records: Vec<RecordEntry>,
}

/// The persisted index document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub file_name: String,
    pub date_created: String,
    /// Absolute catalog path as last opened. Rewritten if the catalog moves.
    pub path: PathBuf,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub collections: Vec<CollectionEntry>,
}

impl IndexDocument {
    pub fn new(file_name: String, path: PathBuf) -> IndexDocument {
        IndexDocument {
            file_name,
            date_created: chrono::Local::now().format("%Y-%m-%d").to_string(),
            path,
            metadata: Metadata::new(),
            collections: Vec::new(),
        }
    }

    /// Load the document from `path`. A missing file is `NotFound`; a file
    /// that cannot be parsed is `Corrupt`.
    pub fn load(path: &Path) -> Result<IndexDocument, CatalogError> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::NotFound(format!(
                    "no index document at {}",
                    path.display()
                )))
            }
            Err(e) => return Err(CatalogError::fs(path, e)),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| CatalogError::Corrupt(format!("{}: {e}", path.display())))
    }
}

/// The index document plus the file it persists to.
///
/// Shared as `Arc<Mutex<IndexStore>>` between the catalog and every
/// collection and record, which address their own descriptors through their
/// stored ordinal indexes. The mutex doubles as the per-catalog mutation
/// lock: one writer at a time.
pub struct IndexStore {
    pub doc: IndexDocument,
    file_path: PathBuf,
}

/// Handle to a catalog's index store.
pub type SharedIndex = Arc<Mutex<IndexStore>>;

impl IndexStore {
    pub fn new(doc: IndexDocument, file_path: PathBuf) -> IndexStore {
        IndexStore { doc, file_path }
    }

    pub fn into_shared(self) -> SharedIndex {
        Arc::new(Mutex::new(self))
    }

    /// Write the full document to disk.
    ///
    /// The document is written to a sibling temp file and renamed over the
    /// live index so an interrupted save cannot leave a truncated document
    /// behind.
    pub fn persist(&self) -> Result<(), CatalogError> {
        let json = serde_json::to_vec_pretty(&self.doc)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;
        let tmp = self.file_path.with_extension("json.tmp");
        fs::write(&tmp, &json).map_err(|e| CatalogError::fs(&tmp, e))?;
        fs::rename(&tmp, &self.file_path).map_err(|e| CatalogError::fs(&self.file_path, e))?;
        debug!(path = %self.file_path.display(), "persisted index document");
        Ok(())
    }

    /// Drop collection entries whose backing directory is gone and
    /// re-densify ordinals. Returns true if the document changed.
    ///
    /// Entries are drained into a snapshot and rebuilt rather than removed
    /// from the list being walked.
    pub fn prune_collections(&mut self, collections_dir: &Path) -> bool {
        let snapshot = std::mem::take(&mut self.doc.collections);
        let mut kept = Vec::with_capacity(snapshot.len());
        let mut changed = false;
        for entry in snapshot {
            if collections_dir.join(&entry.path).is_dir() {
                kept.push(entry);
            } else {
                warn!(collection = %entry.name, "pruning stale collection entry");
                changed = true;
            }
        }
        changed |= reindex_collections(&mut kept);
        self.doc.collections = kept;
        changed
    }

    /// Same healing pass for one collection's records. `collection_dir` is
    /// the absolute directory the record files live in.
    pub fn prune_records(
        &mut self,
        collection_ordinal: usize,
        collection_dir: &Path,
    ) -> Result<bool, CatalogError> {
        let entry = self.collection_mut(collection_ordinal)?;
        let snapshot = std::mem::take(&mut entry.records);
        let mut kept = Vec::with_capacity(snapshot.len());
        let mut changed = false;
        for record in snapshot {
            if collection_dir.join(&record.path).is_file() {
                kept.push(record);
            } else {
                warn!(record = %record.name, "pruning stale record entry");
                changed = true;
            }
        }
        changed |= reindex_records(&mut kept);
        entry.records = kept;
        Ok(changed)
    }

    /// Descriptor of a collection by ordinal. An out-of-range ordinal means
    /// the in-memory tree and the document have diverged.
    pub fn collection_mut(
        &mut self,
        ordinal: usize,
    ) -> Result<&mut CollectionEntry, CatalogError> {
        self.doc.collections.get_mut(ordinal).ok_or_else(|| {
            CatalogError::Corrupt(format!("no collection descriptor at position {ordinal}"))
        })
    }

    /// Descriptor of a record by collection and record ordinal.
    pub fn record_mut(
        &mut self,
        collection_ordinal: usize,
        ordinal: usize,
    ) -> Result<&mut RecordEntry, CatalogError> {
        self.collection_mut(collection_ordinal)?
            .records
            .get_mut(ordinal)
            .ok_or_else(|| {
                CatalogError::Corrupt(format!("no record descriptor at position {ordinal}"))
            })
    }
}

/// Reassign dense zero-based ordinals. Returns true if any changed.
pub fn reindex_collections(entries: &mut [CollectionEntry]) -> bool {
    let mut changed = false;
    for (i, entry) in entries.iter_mut().enumerate() {
        if entry.index != i {
            entry.index = i;
            changed = true;
        }
    }
    changed
}

/// Reassign dense zero-based ordinals. Returns true if any changed.
pub fn reindex_records(entries: &mut [RecordEntry]) -> bool {
    let mut changed = false;
    for (i, entry) in entries.iter_mut().enumerate() {
        if entry.index != i {
            entry.index = i;
            changed = true;
        }
    }
    changed
}
