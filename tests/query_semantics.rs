//! Metadata query behavior over a real catalog.

use datashed::{ArraySlab, Catalog, ElementType};
use serde_json::json;
use tempfile::TempDir;

fn catalog_with_tagged_collections(base: &TempDir) -> Catalog {
    let mut catalog = Catalog::create("study", base.path()).unwrap();
    for (name, value) in [("a", json!("abc")), ("b", json!("xabc")), ("c", json!("abq"))] {
        let collection = catalog.create_collection(name).unwrap();
        collection.update_metadata("k", value).unwrap();
    }
    catalog.create_collection("untagged").unwrap();
    catalog
}

#[test]
fn regex_query_is_prefix_anchored() {
    let base = TempDir::new().unwrap();
    let catalog = catalog_with_tagged_collections(&base);

    let hits = catalog.query_collections("k", &json!("^abc"), true).unwrap();
    let names: Vec<&str> = hits.iter().map(|c| c.name()).collect();
    // "xabc" contains but does not start with the pattern.
    assert_eq!(names, vec!["a"]);
}

#[test]
fn regex_query_matches_prefix_not_whole_value() {
    let base = TempDir::new().unwrap();
    let catalog = catalog_with_tagged_collections(&base);

    let hits = catalog.query_collections("k", &json!("ab"), true).unwrap();
    let names: Vec<&str> = hits.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["a", "c"]);
}

#[test]
fn wildcard_returns_exactly_the_tagged_children() {
    let base = TempDir::new().unwrap();
    let catalog = catalog_with_tagged_collections(&base);

    let hits = catalog.query_collections("k", &json!("*"), false).unwrap();
    let names: Vec<&str> = hits.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn exact_query_is_type_sensitive() {
    let base = TempDir::new().unwrap();
    let mut catalog = Catalog::create("study", base.path()).unwrap();
    catalog
        .create_collection("numeric")
        .unwrap()
        .update_metadata("rev", json!(2))
        .unwrap();
    catalog
        .create_collection("textual")
        .unwrap()
        .update_metadata("rev", json!("2"))
        .unwrap();

    let hits = catalog.query_collections("rev", &json!(2), false).unwrap();
    let names: Vec<&str> = hits.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["numeric"]);
}

#[test]
fn record_queries_follow_the_same_rules() {
    let base = TempDir::new().unwrap();
    let mut catalog = Catalog::create("study", base.path()).unwrap();
    let collection = catalog.create_collection("trial").unwrap();
    let slab = ArraySlab::from_slice(&[0.0], ElementType::F64);

    collection.create_record("plain", &slab).unwrap();
    collection
        .create_record("tagged", &slab)
        .unwrap()
        .update_metadata("kind", json!("power"))
        .unwrap();
    collection
        .create_record("tagged-em", &slab)
        .unwrap()
        .update_metadata("kind", json!("em"))
        .unwrap();

    let exact = collection
        .query_records("kind", &json!("power"), false)
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].name(), "tagged");

    let all = collection.query_records("kind", &json!("*"), false).unwrap();
    let names: Vec<&str> = all.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["tagged", "tagged-em"]);

    // Every record carries date_created; the wildcard sees them all.
    let stamped = collection
        .query_records("date_created", &json!("*"), false)
        .unwrap();
    assert_eq!(stamped.len(), 3);
}
