//! Collection: a named set of records with its own metadata.

use crate::analysis::AnalysisSuite;
use crate::catalog::{Record, CONTENT_EXT, VISUALIZATION_DIR};
use crate::confirm::{ConfirmPolicy, DeleteOutcome};
use crate::content::{ArraySlab, ElementType};
use crate::error::CatalogError;
use crate::index::{Metadata, RecordEntry, SharedIndex};
use crate::{naming, query};
use chrono::Local;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Options for the integrated analysis call-outs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricOptions {
    /// Store the result as a new f32 record in this collection.
    pub save_result: bool,
    /// Allocate a visualization path and pass it to the collaborator.
    pub save_graph: bool,
}

/// A mid-level container of records, one per experimental run.
pub struct Collection {
    name: String,
    dir: PathBuf,
    ordinal: usize,
    shared: SharedIndex,
    records: Vec<Record>,
}

impl Collection {
    /// Build the in-memory object for a freshly created collection whose
    /// descriptor is already in the document.
    pub(crate) fn new(name: String, dir: PathBuf, ordinal: usize, shared: SharedIndex) -> Collection {
        Collection {
            name,
            dir,
            ordinal,
            shared,
            records: Vec::new(),
        }
    }

    /// Attach a collection discovered in an existing index, reconciling its
    /// record descriptors against the filesystem first. Stale entries are
    /// healed silently; the document is persisted at most once.
    pub(crate) fn attach(
        name: String,
        dir: PathBuf,
        ordinal: usize,
        shared: SharedIndex,
    ) -> Result<Collection, CatalogError> {
        let record_entries = {
            let mut store = shared.lock();
            if store.prune_records(ordinal, &dir)? {
                store.persist()?;
            }
            store.collection_mut(ordinal)?.records.clone()
        };

        let records = record_entries
            .into_iter()
            .map(|entry| {
                Record::new(
                    entry.name,
                    entry.path,
                    &dir,
                    entry.index,
                    ordinal,
                    shared.clone(),
                )
            })
            .collect();

        Ok(Collection {
            name,
            dir,
            ordinal,
            shared,
            records,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the collection directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Called when the catalog re-densifies its collection list; keeps the
    /// ordinal addressing of this collection and its records valid.
    pub(crate) fn set_ordinal(&mut self, ordinal: usize) {
        self.ordinal = ordinal;
        for record in &mut self.records {
            record.set_collection_ordinal(ordinal);
        }
    }

    /// Create a record holding `slab`, resolving name collisions against the
    /// sibling map. The descriptor is appended and persisted, the record is
    /// stamped with a `date_created` metadata entry, then the content file
    /// is written.
    pub fn create_record(
        &mut self,
        name: &str,
        slab: &ArraySlab,
    ) -> Result<&mut Record, CatalogError> {
        let desired = naming::normalize(name)?;
        let resolved = naming::resolve_in_memory(&desired, |candidate| {
            self.records.iter().any(|r| r.name() == candidate)
        });
        let file_name = format!("{resolved}.{CONTENT_EXT}");

        let ordinal = {
            let mut store = self.shared.lock();
            let entry = store.collection_mut(self.ordinal)?;
            let ordinal = entry.records.len();
            entry.records.push(RecordEntry {
                name: resolved.clone(),
                path: file_name.clone(),
                metadata: Metadata::new(),
                index: ordinal,
            });
            store.persist()?;
            ordinal
        };

        let mut record = Record::new(
            resolved.clone(),
            file_name,
            &self.dir,
            ordinal,
            self.ordinal,
            self.shared.clone(),
        );
        record.update_metadata(
            "date_created",
            Value::String(Local::now().format("%Y-%m-%d").to_string()),
        )?;
        record.write_all(slab)?;

        info!(collection = %self.name, record = %resolved, "created record");
        self.records.push(record);
        let last = self.records.len() - 1;
        Ok(&mut self.records[last])
    }

    /// Look up a record by name.
    pub fn record(&self, name: &str) -> Result<&Record, CatalogError> {
        let name = naming::normalize(name)?;
        self.records
            .iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| CatalogError::NotFound(format!("record '{name}' in '{}'", self.name)))
    }

    /// Look up a record by name for mutation.
    pub fn record_mut(&mut self, name: &str) -> Result<&mut Record, CatalogError> {
        let name = naming::normalize(name)?;
        let collection = self.name.clone();
        self.records
            .iter_mut()
            .find(|r| r.name() == name)
            .ok_or_else(|| CatalogError::NotFound(format!("record '{name}' in '{collection}'")))
    }

    /// Record names in insertion order.
    pub fn record_names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name()).collect()
    }

    /// Delete a record: confirmation first, then the in-memory entry, the
    /// content file, and the persisted descriptor, re-densifying ordinals.
    pub fn delete_record(
        &mut self,
        name: &str,
        confirmer: &dyn ConfirmPolicy,
    ) -> Result<DeleteOutcome, CatalogError> {
        let name = naming::normalize(name)?;
        let position = self
            .records
            .iter()
            .position(|r| r.name() == name)
            .ok_or_else(|| CatalogError::NotFound(format!("record '{name}' in '{}'", self.name)))?;

        let prompt = format!(
            "You are about to delete record '{name}' in collection '{}'. Proceed?",
            self.name
        );
        if !confirmer.confirm(&prompt)? {
            info!(collection = %self.name, record = %name, "record deletion cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let record = self.records.remove(position);
        match fs::remove_file(record.content_path()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                let err = CatalogError::fs(record.content_path(), e);
                self.records.insert(position, record);
                return Err(err);
            }
        }

        {
            let mut store = self.shared.lock();
            let entry = store.collection_mut(self.ordinal)?;
            if position < entry.records.len() {
                entry.records.remove(position);
            }
            crate::index::reindex_records(&mut entry.records);
            store.persist()?;
        }
        for (i, record) in self.records.iter_mut().enumerate() {
            record.set_ordinal(i);
        }

        info!(collection = %self.name, record = %name, "deleted record");
        Ok(DeleteOutcome::Deleted)
    }

    /// Set one metadata key, mirror it into this collection's descriptor,
    /// and persist the index document.
    pub fn update_metadata(&mut self, key: &str, value: Value) -> Result<(), CatalogError> {
        let key = naming::normalize_key(key)?;
        let mut store = self.shared.lock();
        store
            .collection_mut(self.ordinal)?
            .metadata
            .insert(key, value);
        store.persist()
    }

    /// Snapshot of the collection's metadata map.
    pub fn metadata(&self) -> Result<Metadata, CatalogError> {
        let mut store = self.shared.lock();
        Ok(store.collection_mut(self.ordinal)?.metadata.clone())
    }

    /// Records whose metadata matches, in insertion order.
    pub fn query_records(
        &self,
        key: &str,
        value: &Value,
        use_regex: bool,
    ) -> Result<Vec<&Record>, CatalogError> {
        let positions = {
            let mut store = self.shared.lock();
            let entry = store.collection_mut(self.ordinal)?;
            query::matching_positions(
                entry.records.iter().map(|r| &r.metadata),
                key,
                value,
                use_regex,
            )?
        };
        Ok(positions.into_iter().map(|i| &self.records[i]).collect())
    }

    /// The collection's visualization directory.
    pub fn visualization_dir(&self) -> PathBuf {
        self.dir.join(VISUALIZATION_DIR)
    }

    /// Allocate a collision-free `.png` path inside the visualization
    /// directory, using the same suffixing rule as record names.
    pub fn allocate_visualization_path(&self, base_name: &str) -> Result<PathBuf, CatalogError> {
        let base_name = naming::normalize(base_name)?;
        let (_, path) = naming::resolve_file_path(&self.visualization_dir(), &base_name, "png");
        Ok(path)
    }

    /// Signal-to-noise ratio over one record's full contents, delegated to
    /// the analysis collaborator.
    pub fn signal_to_noise(
        &mut self,
        suite: &dyn AnalysisSuite,
        traces_record: &str,
        opts: MetricOptions,
    ) -> Result<ArraySlab, CatalogError> {
        let traces = self.record(traces_record)?.read_all()?;
        let stem = format!("{}_snr", naming::normalize(traces_record)?);
        let graph = self.graph_path(&stem, opts)?;
        let snr = suite.signal_to_noise(&traces, graph.as_deref())?;
        if opts.save_result {
            self.create_record(&stem, &snr.cast(ElementType::F32))?;
        }
        Ok(snr)
    }

    /// Fixed-vs-random t-test, yielding the value series and its running
    /// maximum series.
    pub fn t_test(
        &mut self,
        suite: &dyn AnalysisSuite,
        fixed_record: &str,
        random_record: &str,
        opts: MetricOptions,
    ) -> Result<(ArraySlab, ArraySlab), CatalogError> {
        let fixed = self.record(fixed_record)?.read_all()?;
        let random = self.record(random_record)?.read_all()?;
        let stem = format!(
            "t_test_{}_{}",
            naming::normalize(random_record)?,
            naming::normalize(fixed_record)?
        );
        let max_stem = format!(
            "t_max_{}_{}",
            naming::normalize(random_record)?,
            naming::normalize(fixed_record)?
        );
        let graphs = if opts.save_graph {
            Some((
                self.allocate_visualization_path(&stem)?,
                self.allocate_visualization_path(&max_stem)?,
            ))
        } else {
            None
        };
        let (t, t_max) = suite.t_test(
            &fixed,
            &random,
            graphs.as_ref().map(|(a, b)| (a.as_path(), b.as_path())),
        )?;
        if opts.save_result {
            self.create_record(&stem, &t.cast(ElementType::F32))?;
            self.create_record(&max_stem, &t_max.cast(ElementType::F32))?;
        }
        Ok((t, t_max))
    }

    /// Correlation between predicted and observed record contents.
    pub fn correlation(
        &mut self,
        suite: &dyn AnalysisSuite,
        predicted_record: &str,
        observed_record: &str,
        opts: MetricOptions,
    ) -> Result<ArraySlab, CatalogError> {
        let predicted = self.record(predicted_record)?.read_all()?;
        let observed = self.record(observed_record)?.read_all()?;
        let stem = format!(
            "corr_{}_{}",
            naming::normalize(predicted_record)?,
            naming::normalize(observed_record)?
        );
        let graph = self.graph_path(&stem, opts)?;
        let corr = suite.correlation(&predicted, &observed, graph.as_deref())?;
        if opts.save_result {
            self.create_record(&stem, &corr.cast(ElementType::F32))?;
        }
        Ok(corr)
    }

    fn graph_path(
        &self,
        stem: &str,
        opts: MetricOptions,
    ) -> Result<Option<PathBuf>, CatalogError> {
        if opts.save_graph {
            Ok(Some(self.allocate_visualization_path(stem)?))
        } else {
            Ok(None)
        }
    }
}
