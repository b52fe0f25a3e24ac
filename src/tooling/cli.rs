//! CLI Tooling
//!
//! Command-line interface for catalog operations. Commands resolve a catalog
//! under the configured base path, perform one library call, and render the
//! result as text.

use crate::catalog::Catalog;
use crate::confirm::{Approve, ConfirmPolicy, DeleteOutcome, TerminalConfirm};
use crate::content::{ArraySlab, ElementType};
use crate::error::CatalogError;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use serde_json::Value;
use std::path::PathBuf;

/// Datashed CLI - filesystem-backed metadata catalog
#[derive(Parser)]
#[command(name = "datashed")]
#[command(about = "Filesystem-backed metadata catalog for experimental datasets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base directory for catalogs (overrides configuration)
    #[arg(long)]
    pub base_path: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new catalog
    Init {
        /// Catalog name; collisions are resolved by suffixing
        name: String,
    },
    /// List a catalog's collections and records
    Show { catalog: String },
    /// Create a collection inside a catalog
    AddCollection { catalog: String, name: String },
    /// Create a record from a list of values
    AddRecord {
        catalog: String,
        collection: String,
        name: String,
        /// Comma-separated numeric values
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<f64>,
        /// Element type (f32, f64, i16, i32, i64, u8)
        #[arg(long, default_value = "f64")]
        dtype: String,
    },
    /// Print a record's contents
    ReadRecord {
        catalog: String,
        collection: String,
        name: String,
    },
    /// Set a metadata key, or print it when no value is given
    Meta {
        catalog: String,
        /// Collection to address; omit for catalog-level metadata
        #[arg(long)]
        collection: Option<String>,
        /// Record to address; requires --collection
        #[arg(long)]
        record: Option<String>,
        key: String,
        /// JSON value (bare words are treated as strings)
        value: Option<String>,
    },
    /// Query children by metadata key and value
    Query {
        catalog: String,
        /// Query this collection's records instead of the catalog's
        /// collections
        #[arg(long)]
        collection: Option<String>,
        key: String,
        /// Exact value, "*" for key presence, or a pattern with --regex
        value: String,
        /// Treat the value as a prefix-matching regular expression
        #[arg(long)]
        regex: bool,
    },
    /// Delete a collection
    RmCollection {
        catalog: String,
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Delete a record
    RmRecord {
        catalog: String,
        collection: String,
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Delete a whole catalog
    RmCatalog {
        catalog: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Execution context carrying the resolved base path.
pub struct CliContext {
    base_path: PathBuf,
}

impl CliContext {
    pub fn new(base_path: PathBuf) -> CliContext {
        CliContext { base_path }
    }

    fn open(&self, name: &str) -> Result<Catalog, CatalogError> {
        Catalog::open(name, &self.base_path)
    }

    fn confirmer(force: bool) -> Box<dyn ConfirmPolicy> {
        if force {
            Box::new(Approve)
        } else {
            Box::new(TerminalConfirm)
        }
    }

    /// Execute a command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String, CatalogError> {
        match command {
            Commands::Init { name } => {
                let catalog = Catalog::create(name, &self.base_path)?;
                Ok(format!(
                    "Created catalog '{}' at {}",
                    catalog.name(),
                    catalog.path().display()
                ))
            }
            Commands::Show { catalog } => {
                let catalog = self.open(catalog)?;
                let mut table = Table::new();
                table.set_header(vec!["Collection", "Record", "Content file"]);
                for name in catalog.collection_names() {
                    let collection = catalog.collection(name)?;
                    if collection.record_names().is_empty() {
                        table.add_row(vec![name, "-", "-"]);
                    }
                    for record_name in collection.record_names() {
                        let record = collection.record(record_name)?;
                        table.add_row(vec![name, record.name(), record.file_name()]);
                    }
                }
                Ok(table.to_string())
            }
            Commands::AddCollection { catalog, name } => {
                let mut catalog = self.open(catalog)?;
                let collection = catalog.create_collection(name)?;
                Ok(format!("Created collection '{}'", collection.name()))
            }
            Commands::AddRecord {
                catalog,
                collection,
                name,
                values,
                dtype,
            } => {
                let mut catalog = self.open(catalog)?;
                let slab = ArraySlab::from_slice(values, ElementType::parse(dtype)?);
                let collection = catalog.collection_mut(collection)?;
                let record = collection.create_record(name, &slab)?;
                Ok(format!(
                    "Created record '{}' ({} elements, {})",
                    record.name(),
                    values.len(),
                    dtype
                ))
            }
            Commands::ReadRecord {
                catalog,
                collection,
                name,
            } => {
                let catalog = self.open(catalog)?;
                let slab = catalog.collection(collection)?.record(name)?.read_all()?;
                let rendered: Vec<String> =
                    slab.to_f64().iter().map(|v| v.to_string()).collect();
                Ok(format!(
                    "shape {:?} ({}): [{}]",
                    slab.shape(),
                    slab.dtype().name(),
                    rendered.join(", ")
                ))
            }
            Commands::Meta {
                catalog,
                collection,
                record,
                key,
                value,
            } => {
                let mut catalog = self.open(catalog)?;
                match value {
                    Some(raw) => {
                        let value = parse_value(raw);
                        match (collection, record) {
                            (Some(c), Some(r)) => catalog
                                .collection_mut(c)?
                                .record_mut(r)?
                                .update_metadata(key, value)?,
                            (Some(c), None) => {
                                catalog.collection_mut(c)?.update_metadata(key, value)?
                            }
                            (None, None) => catalog.update_metadata(key, value)?,
                            (None, Some(_)) => {
                                return Err(CatalogError::InvalidInput(
                                    "--record requires --collection".to_string(),
                                ))
                            }
                        }
                        Ok(format!("Set '{}'", key.to_lowercase()))
                    }
                    None => {
                        let metadata = match (collection, record) {
                            (Some(c), Some(r)) => {
                                catalog.collection(c)?.record(r)?.metadata()?
                            }
                            (Some(c), None) => catalog.collection(c)?.metadata()?,
                            (None, None) => catalog.metadata(),
                            (None, Some(_)) => {
                                return Err(CatalogError::InvalidInput(
                                    "--record requires --collection".to_string(),
                                ))
                            }
                        };
                        match metadata.get(&key.to_lowercase()) {
                            Some(value) => Ok(value.to_string()),
                            None => Err(CatalogError::NotFound(format!("metadata key '{key}'"))),
                        }
                    }
                }
            }
            Commands::Query {
                catalog,
                collection,
                key,
                value,
                regex,
            } => {
                let catalog = self.open(catalog)?;
                let query_value = if *regex {
                    Value::String(value.clone())
                } else {
                    parse_value(value)
                };
                let names: Vec<String> = match collection {
                    Some(c) => catalog
                        .collection(c)?
                        .query_records(key, &query_value, *regex)?
                        .into_iter()
                        .map(|r| r.name().to_string())
                        .collect(),
                    None => catalog
                        .query_collections(key, &query_value, *regex)?
                        .into_iter()
                        .map(|c| c.name().to_string())
                        .collect(),
                };
                Ok(names.join("\n"))
            }
            Commands::RmCollection {
                catalog,
                name,
                force,
            } => {
                let mut catalog = self.open(catalog)?;
                match catalog.delete_collection(name, Self::confirmer(*force).as_ref())? {
                    DeleteOutcome::Deleted => Ok(format!("Deleted collection '{name}'")),
                    DeleteOutcome::Cancelled => Ok("Deletion cancelled".to_string()),
                }
            }
            Commands::RmRecord {
                catalog,
                collection,
                name,
                force,
            } => {
                let mut catalog = self.open(catalog)?;
                let collection = catalog.collection_mut(collection)?;
                match collection.delete_record(name, Self::confirmer(*force).as_ref())? {
                    DeleteOutcome::Deleted => Ok(format!("Deleted record '{name}'")),
                    DeleteOutcome::Cancelled => Ok("Deletion cancelled".to_string()),
                }
            }
            Commands::RmCatalog { catalog, force } => {
                let name = catalog.clone();
                let catalog = self.open(catalog)?;
                match catalog.delete(Self::confirmer(*force).as_ref())? {
                    DeleteOutcome::Deleted => Ok(format!("Deleted catalog '{name}'")),
                    DeleteOutcome::Cancelled => Ok("Deletion cancelled".to_string()),
                }
            }
        }
    }
}

/// Parse a CLI value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_reads_json_and_falls_back_to_string() {
        assert_eq!(parse_value("3"), Value::from(3));
        assert_eq!(parse_value("true"), Value::from(true));
        assert_eq!(parse_value("plain"), Value::from("plain"));
        assert_eq!(parse_value("\"quoted\""), Value::from("quoted"));
    }
}
