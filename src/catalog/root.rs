//! Catalog: top-level container and sole owner of the index document.

use crate::catalog::{Collection, COLLECTIONS_DIR, VISUALIZATION_DIR};
use crate::confirm::{ConfirmPolicy, DeleteOutcome};
use crate::error::CatalogError;
use crate::index::{
    CollectionEntry, IndexDocument, IndexStore, Metadata, SharedIndex, INDEX_FILE,
};
use crate::{naming, query};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// The root of one catalog tree.
///
/// Created fresh with [`Catalog::create`] (allocates directories and an
/// empty index) or opened against an existing directory with
/// [`Catalog::open`] (loads the index and reconciles it against the
/// filesystem). All mutations anywhere in the tree flow through the shared
/// index store this type owns.
pub struct Catalog {
    name: String,
    path: PathBuf,
    collections_path: PathBuf,
    shared: SharedIndex,
    collections: Vec<Collection>,
}

impl Catalog {
    /// Create a new catalog under `base_path`.
    ///
    /// The requested name is normalized and, if the directory already
    /// exists, suffixed until a free name is found; the returned catalog
    /// carries the final name.
    pub fn create(name: &str, base_path: &Path) -> Result<Catalog, CatalogError> {
        let desired = naming::normalize(name)?;
        fs::create_dir_all(base_path).map_err(|e| CatalogError::fs(base_path, e))?;
        let resolved = naming::claim_directory(base_path, &desired, &[COLLECTIONS_DIR])?;
        let path = base_path.join(&resolved);

        let doc = IndexDocument::new(resolved.clone(), path.clone());
        let store = IndexStore::new(doc, path.join(INDEX_FILE));
        store.persist()?;

        info!(catalog = %resolved, path = %path.display(), "created catalog");
        Ok(Catalog {
            name: resolved,
            collections_path: path.join(COLLECTIONS_DIR),
            path,
            shared: store.into_shared(),
            collections: Vec::new(),
        })
    }

    /// Open an existing catalog directory.
    ///
    /// Loads the index document, rewrites its stored path if the catalog
    /// was moved, then reconciles every collection (and, transitively,
    /// every record) against what is actually on disk. Descriptors whose
    /// backing paths are gone are dropped and the healed document is
    /// persisted; nothing is reported as an error.
    pub fn open(name: &str, base_path: &Path) -> Result<Catalog, CatalogError> {
        let name = naming::normalize(name)?;
        let path = base_path.join(&name);
        let collections_path = path.join(COLLECTIONS_DIR);

        let mut doc = IndexDocument::load(&path.join(INDEX_FILE))?;
        let moved = doc.path != path;
        if moved {
            info!(
                catalog = %name,
                old = %doc.path.display(),
                new = %path.display(),
                "catalog was moved, rewriting stored path"
            );
            doc.path = path.clone();
        }

        let mut store = IndexStore::new(doc, path.join(INDEX_FILE));
        let pruned = store.prune_collections(&collections_path);
        if moved || pruned {
            store.persist()?;
        }

        let entries: Vec<CollectionEntry> = store.doc.collections.clone();
        let shared = store.into_shared();

        let mut collections = Vec::with_capacity(entries.len());
        for entry in entries {
            collections.push(Collection::attach(
                entry.name,
                collections_path.join(&entry.path),
                entry.index,
                shared.clone(),
            )?);
        }

        Ok(Catalog {
            name,
            path,
            collections_path,
            shared,
            collections,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the catalog directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creation date recorded in the index, `YYYY-MM-DD`.
    pub fn date_created(&self) -> String {
        self.shared.lock().doc.date_created.clone()
    }

    /// Create a collection, resolving name collisions by directory
    /// creation. The new collection starts with an empty metadata map and a
    /// `visualization` subdirectory.
    pub fn create_collection(&mut self, name: &str) -> Result<&mut Collection, CatalogError> {
        let desired = naming::normalize(name)?;
        let resolved =
            naming::claim_directory(&self.collections_path, &desired, &[VISUALIZATION_DIR])?;
        let dir = self.collections_path.join(&resolved);

        let ordinal = {
            let mut store = self.shared.lock();
            let ordinal = store.doc.collections.len();
            store.doc.collections.push(CollectionEntry {
                name: resolved.clone(),
                path: resolved.clone(),
                metadata: Metadata::new(),
                index: ordinal,
                records: Vec::new(),
            });
            store.persist()?;
            ordinal
        };

        info!(catalog = %self.name, collection = %resolved, "created collection");
        self.collections
            .push(Collection::new(resolved, dir, ordinal, self.shared.clone()));
        let last = self.collections.len() - 1;
        Ok(&mut self.collections[last])
    }

    /// Look up a collection by name.
    pub fn collection(&self, name: &str) -> Result<&Collection, CatalogError> {
        let name = naming::normalize(name)?;
        self.collections
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| CatalogError::NotFound(format!("collection '{name}'")))
    }

    /// Look up a collection by name for mutation.
    pub fn collection_mut(&mut self, name: &str) -> Result<&mut Collection, CatalogError> {
        let name = naming::normalize(name)?;
        self.collections
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(|| CatalogError::NotFound(format!("collection '{name}'")))
    }

    /// Collection names in insertion order.
    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.name()).collect()
    }

    /// Delete one collection: confirmation first, then the in-memory entry,
    /// the backing directory tree, and the persisted descriptor. Remaining
    /// ordinals are re-densified so descriptor addressing stays valid.
    pub fn delete_collection(
        &mut self,
        name: &str,
        confirmer: &dyn ConfirmPolicy,
    ) -> Result<DeleteOutcome, CatalogError> {
        let name = naming::normalize(name)?;
        let position = self
            .collections
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| CatalogError::NotFound(format!("collection '{name}'")))?;

        let prompt = format!(
            "You are about to delete collection '{name}' in catalog '{}'. Proceed?",
            self.name
        );
        if !confirmer.confirm(&prompt)? {
            info!(catalog = %self.name, collection = %name, "collection deletion cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let collection = self.collections.remove(position);
        if let Err(e) = fs::remove_dir_all(collection.dir()) {
            // Keep memory and document in step: the descriptor was not
            // removed, so the in-memory entry must come back too.
            let err = CatalogError::fs(collection.dir(), e);
            self.collections.insert(position, collection);
            return Err(err);
        }

        {
            let mut store = self.shared.lock();
            if position < store.doc.collections.len() {
                store.doc.collections.remove(position);
            }
            crate::index::reindex_collections(&mut store.doc.collections);
            store.persist()?;
        }
        for (i, collection) in self.collections.iter_mut().enumerate() {
            collection.set_ordinal(i);
        }

        info!(catalog = %self.name, collection = %name, "deleted collection");
        Ok(DeleteOutcome::Deleted)
    }

    /// Delete the whole catalog tree. Consumes the catalog on approval.
    pub fn delete(self, confirmer: &dyn ConfirmPolicy) -> Result<DeleteOutcome, CatalogError> {
        let prompt = format!("You are about to delete catalog '{}'. Proceed?", self.name);
        if !confirmer.confirm(&prompt)? {
            info!(catalog = %self.name, "catalog deletion cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }
        fs::remove_dir_all(&self.path).map_err(|e| CatalogError::fs(&self.path, e))?;
        info!(catalog = %self.name, "deleted catalog");
        Ok(DeleteOutcome::Deleted)
    }

    /// Set one catalog-level metadata key and persist the index document.
    pub fn update_metadata(&mut self, key: &str, value: Value) -> Result<(), CatalogError> {
        let key = naming::normalize_key(key)?;
        let mut store = self.shared.lock();
        store.doc.metadata.insert(key, value);
        store.persist()
    }

    /// Snapshot of the catalog's metadata map.
    pub fn metadata(&self) -> Metadata {
        self.shared.lock().doc.metadata.clone()
    }

    /// Collections whose metadata matches, in insertion order.
    pub fn query_collections(
        &self,
        key: &str,
        value: &Value,
        use_regex: bool,
    ) -> Result<Vec<&Collection>, CatalogError> {
        let positions = {
            let store = self.shared.lock();
            query::matching_positions(
                store.doc.collections.iter().map(|c| &c.metadata),
                key,
                value,
                use_regex,
            )?
        };
        Ok(positions.into_iter().map(|i| &self.collections[i]).collect())
    }
}
