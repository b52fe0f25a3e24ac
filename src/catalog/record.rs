//! Record: leaf entity wrapping one serialized array and its metadata.

use crate::content::ArraySlab;
use crate::error::CatalogError;
use crate::index::{Metadata, SharedIndex};
use crate::naming;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// One named array inside a collection.
///
/// The record's content lives in its own file next to the collection's other
/// records; its metadata lives in the record's descriptor inside the shared
/// index document, addressed by `(collection_ordinal, ordinal)`.
pub struct Record {
    name: String,
    file_name: String,
    content_path: PathBuf,
    ordinal: usize,
    collection_ordinal: usize,
    shared: SharedIndex,
}

impl Record {
    pub(crate) fn new(
        name: String,
        file_name: String,
        collection_dir: &Path,
        ordinal: usize,
        collection_ordinal: usize,
        shared: SharedIndex,
    ) -> Record {
        Record {
            content_path: collection_dir.join(&file_name),
            name,
            file_name,
            ordinal,
            collection_ordinal,
            shared,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content file name relative to the collection directory.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Absolute path of the content file.
    pub fn content_path(&self) -> &Path {
        &self.content_path
    }

    pub(crate) fn set_ordinal(&mut self, ordinal: usize) {
        self.ordinal = ordinal;
    }

    pub(crate) fn set_collection_ordinal(&mut self, ordinal: usize) {
        self.collection_ordinal = ordinal;
    }

    /// Serialize the array to the content file, replacing any previous
    /// content.
    pub fn write_all(&mut self, slab: &ArraySlab) -> Result<(), CatalogError> {
        let bytes = slab.to_bytes()?;
        fs::write(&self.content_path, bytes).map_err(|e| CatalogError::fs(&self.content_path, e))
    }

    /// Deserialize and return the full content array.
    pub fn read_all(&self) -> Result<ArraySlab, CatalogError> {
        let bytes =
            fs::read(&self.content_path).map_err(|e| CatalogError::fs(&self.content_path, e))?;
        ArraySlab::from_bytes(&bytes)
    }

    /// Return the `[start, end)` sub-sequence along the first axis, with
    /// slice-style clamping of out-of-range bounds.
    pub fn read_range(&self, start: usize, end: usize) -> Result<ArraySlab, CatalogError> {
        Ok(self.read_all()?.row_slice(start, end))
    }

    /// Set one metadata key, mirror it into the record's descriptor, and
    /// persist the index document.
    pub fn update_metadata(&mut self, key: &str, value: Value) -> Result<(), CatalogError> {
        let key = naming::normalize_key(key)?;
        let mut store = self.shared.lock();
        store
            .record_mut(self.collection_ordinal, self.ordinal)?
            .metadata
            .insert(key, value);
        store.persist()
    }

    /// Snapshot of the record's metadata map.
    pub fn metadata(&self) -> Result<Metadata, CatalogError> {
        let mut store = self.shared.lock();
        Ok(store
            .record_mut(self.collection_ordinal, self.ordinal)?
            .metadata
            .clone())
    }
}
