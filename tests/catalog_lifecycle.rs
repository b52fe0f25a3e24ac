//! End-to-end lifecycle tests: create, reopen, reconcile, delete.

use datashed::confirm::{Approve, Deny};
use datashed::{ArraySlab, Catalog, DeleteOutcome, ElementType};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn end_to_end_study_trial_traces() {
    let base = TempDir::new().unwrap();
    let mut catalog = Catalog::create("Study", base.path()).unwrap();
    assert_eq!(catalog.name(), "study");

    let collection = catalog.create_collection("Trial").unwrap();
    assert_eq!(collection.name(), "trial");
    assert!(collection.dir().join("visualization").is_dir());

    let slab = ArraySlab::from_slice(&[1.0, 2.0, 3.0], ElementType::F32);
    let record = collection.create_record("Traces", &slab).unwrap();
    assert_eq!(record.name(), "traces");
    assert!(record.metadata().unwrap().contains_key("date_created"));

    let range = record.read_range(1, 3).unwrap();
    assert_eq!(range.to_f64(), vec![2.0, 3.0]);
}

#[test]
fn repeated_names_get_suffix_chain() {
    let base = TempDir::new().unwrap();
    let mut catalog = Catalog::create("study", base.path()).unwrap();
    for _ in 0..3 {
        catalog.create_collection("Run").unwrap();
    }
    assert_eq!(catalog.collection_names(), vec!["run", "run-1", "run-2"]);

    let collection = catalog.collection_mut("run").unwrap();
    let slab = ArraySlab::from_slice(&[0.0], ElementType::F64);
    let mut names = Vec::new();
    for _ in 0..3 {
        names.push(collection.create_record("Trace", &slab).unwrap().name().to_string());
    }
    assert_eq!(names, vec!["trace", "trace-1", "trace-2"]);
}

#[test]
fn catalog_creation_resolves_directory_collisions() {
    let base = TempDir::new().unwrap();
    let first = Catalog::create("study", base.path()).unwrap();
    let second = Catalog::create("study", base.path()).unwrap();
    let third = Catalog::create("study", base.path()).unwrap();
    assert_eq!(first.name(), "study");
    assert_eq!(second.name(), "study-1");
    assert_eq!(third.name(), "study-2");
}

#[test]
fn metadata_round_trips_through_reopen() {
    let base = TempDir::new().unwrap();
    {
        let mut catalog = Catalog::create("study", base.path()).unwrap();
        catalog.update_metadata("Operator", json!("sam")).unwrap();
        let collection = catalog.create_collection("trial").unwrap();
        collection.update_metadata("Voltage", json!(3.3)).unwrap();
        let slab = ArraySlab::from_slice(&[1.0], ElementType::F64);
        let record = collection.create_record("traces", &slab).unwrap();
        record.update_metadata("Probe", json!("em")).unwrap();
    }

    let catalog = Catalog::open("study", base.path()).unwrap();
    assert_eq!(catalog.metadata().get("operator"), Some(&json!("sam")));
    let collection = catalog.collection("trial").unwrap();
    assert_eq!(collection.metadata().unwrap().get("voltage"), Some(&json!(3.3)));
    let record = collection.record("traces").unwrap();
    assert_eq!(record.metadata().unwrap().get("probe"), Some(&json!("em")));
}

#[test]
fn content_round_trips_with_cast() {
    let base = TempDir::new().unwrap();
    let mut catalog = Catalog::create("study", base.path()).unwrap();
    let collection = catalog.create_collection("trial").unwrap();
    let record = collection
        .create_record("traces", &ArraySlab::from_slice(&[1.7, 2.2], ElementType::I32))
        .unwrap();

    let read = record.read_all().unwrap();
    assert_eq!(read.dtype(), ElementType::I32);
    assert_eq!(read.to_f64(), vec![1.0, 2.0]);

    // A full write replaces previous content.
    record
        .write_all(&ArraySlab::from_slice(&[9.0], ElementType::F32))
        .unwrap();
    assert_eq!(record.read_all().unwrap().to_f64(), vec![9.0]);
}

#[test]
fn reconciliation_prunes_missing_collection_and_is_idempotent() {
    let base = TempDir::new().unwrap();
    {
        let mut catalog = Catalog::create("study", base.path()).unwrap();
        for name in ["a", "b", "c"] {
            catalog.create_collection(name).unwrap();
        }
    }

    // Remove one collection directory behind the catalog's back.
    let victim = base.path().join("study").join("Collections").join("b");
    fs::remove_dir_all(&victim).unwrap();

    {
        let catalog = Catalog::open("study", base.path()).unwrap();
        assert_eq!(catalog.collection_names(), vec!["a", "c"]);
    }

    let index_path = base.path().join("study").join("index.json");
    let healed = fs::read_to_string(&index_path).unwrap();

    // A second open finds nothing left to heal.
    {
        let catalog = Catalog::open("study", base.path()).unwrap();
        assert_eq!(catalog.collection_names(), vec!["a", "c"]);
    }
    assert_eq!(fs::read_to_string(&index_path).unwrap(), healed);
}

#[test]
fn reconciliation_prunes_missing_record_file() {
    let base = TempDir::new().unwrap();
    {
        let mut catalog = Catalog::create("study", base.path()).unwrap();
        let collection = catalog.create_collection("trial").unwrap();
        let slab = ArraySlab::from_slice(&[1.0], ElementType::F64);
        collection.create_record("keep", &slab).unwrap();
        collection.create_record("lose", &slab).unwrap();
    }

    let lost = base
        .path()
        .join("study")
        .join("Collections")
        .join("trial")
        .join("lose.dat");
    fs::remove_file(&lost).unwrap();

    let catalog = Catalog::open("study", base.path()).unwrap();
    let collection = catalog.collection("trial").unwrap();
    assert_eq!(collection.record_names(), vec!["keep"]);

    // The healed document no longer mentions the lost record.
    let index = fs::read_to_string(base.path().join("study").join("index.json")).unwrap();
    assert!(!index.contains("lose.dat"));
}

#[test]
fn refused_confirmation_cancels_without_touching_state() {
    let base = TempDir::new().unwrap();
    let mut catalog = Catalog::create("study", base.path()).unwrap();
    catalog.create_collection("trial").unwrap();

    let outcome = catalog.delete_collection("trial", &Deny).unwrap();
    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(catalog.collection_names(), vec!["trial"]);
    assert!(base
        .path()
        .join("study")
        .join("Collections")
        .join("trial")
        .is_dir());
}

#[test]
fn deleting_a_collection_removes_tree_and_reindexes_survivors() {
    let base = TempDir::new().unwrap();
    let mut catalog = Catalog::create("study", base.path()).unwrap();
    catalog.create_collection("first").unwrap();
    catalog.create_collection("second").unwrap();

    let outcome = catalog.delete_collection("first", &Approve).unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(!base
        .path()
        .join("study")
        .join("Collections")
        .join("first")
        .exists());
    assert_eq!(catalog.collection_names(), vec!["second"]);

    // The survivor moved to position zero; descriptor addressing must
    // still land on it.
    catalog
        .collection_mut("second")
        .unwrap()
        .update_metadata("marker", json!(true))
        .unwrap();

    let index: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(base.path().join("study").join("index.json")).unwrap())
            .unwrap();
    let collections = index.get("collections").unwrap().as_array().unwrap();
    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0].get("name").unwrap(), "second");
    assert_eq!(collections[0].get("index").unwrap(), 0);
    assert_eq!(
        collections[0].get("metadata").unwrap().get("marker").unwrap(),
        &json!(true)
    );
}

#[test]
fn deleting_a_record_reindexes_survivors() {
    let base = TempDir::new().unwrap();
    let mut catalog = Catalog::create("study", base.path()).unwrap();
    let collection = catalog.create_collection("trial").unwrap();
    let slab = ArraySlab::from_slice(&[1.0], ElementType::F64);
    collection.create_record("one", &slab).unwrap();
    collection.create_record("two", &slab).unwrap();

    let outcome = collection.delete_record("one", &Approve).unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(collection.record_names(), vec!["two"]);
    assert!(!collection.dir().join("one.dat").exists());

    collection
        .record_mut("two")
        .unwrap()
        .update_metadata("marker", json!(1))
        .unwrap();
    assert_eq!(
        collection.record("two").unwrap().metadata().unwrap().get("marker"),
        Some(&json!(1))
    );
}

#[test]
fn failed_directory_removal_keeps_memory_and_document_in_step() {
    let base = TempDir::new().unwrap();
    let mut catalog = Catalog::create("study", base.path()).unwrap();
    catalog.create_collection("trial").unwrap();
    catalog
        .collection_mut("trial")
        .unwrap()
        .update_metadata("k", json!("v"))
        .unwrap();

    // Removing the backing tree fails because it is already gone.
    let dir = base.path().join("study").join("Collections").join("trial");
    fs::remove_dir_all(&dir).unwrap();
    let result = catalog.delete_collection("trial", &Approve);
    assert!(result.is_err());

    // The descriptor was never removed, so the in-memory entry must still
    // be there and document positions must still map onto it.
    assert_eq!(catalog.collection_names(), vec!["trial"]);
    let hits = catalog.query_collections("k", &json!("*"), false).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name(), "trial");
}

#[test]
fn opening_a_moved_catalog_rewrites_the_stored_path() {
    let base = TempDir::new().unwrap();
    let old_base = base.path().join("old");
    let new_base = base.path().join("new");
    fs::create_dir_all(&new_base).unwrap();
    Catalog::create("study", &old_base).unwrap();

    fs::rename(old_base.join("study"), new_base.join("study")).unwrap();

    let catalog = Catalog::open("study", &new_base).unwrap();
    assert_eq!(catalog.path(), new_base.join("study"));

    let index: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(new_base.join("study").join("index.json")).unwrap())
            .unwrap();
    assert_eq!(
        index.get("path").unwrap().as_str().unwrap(),
        new_base.join("study").to_str().unwrap()
    );
}

#[test]
fn deleting_the_catalog_removes_everything() {
    let base = TempDir::new().unwrap();
    let catalog = Catalog::create("study", base.path()).unwrap();
    let path = catalog.path().to_path_buf();
    assert_eq!(catalog.delete(&Approve).unwrap(), DeleteOutcome::Deleted);
    assert!(!path.exists());
}

#[test]
fn opening_a_missing_catalog_is_not_found() {
    let base = TempDir::new().unwrap();
    let result = Catalog::open("nothing", base.path());
    assert!(matches!(result, Err(datashed::CatalogError::NotFound(_))));
}
