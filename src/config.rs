//! Configuration loading.
//!
//! Precedence, lowest to highest: built-in defaults, the global config file
//! (`<config dir>/datashed/config.toml`) or an explicitly given file, then
//! `DATASHED_*` environment variables.

use crate::error::CatalogError;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatashedConfig {
    /// Directory catalogs are created in and opened from when the caller
    /// does not pass one explicitly.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DatashedConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_base_path() -> PathBuf {
    directories::ProjectDirs::from("", "datashed", "datashed")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Global config file path (`<config dir>/datashed/config.toml`).
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "datashed", "datashed")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the standard sources.
    pub fn load() -> Result<DatashedConfig, CatalogError> {
        let mut builder = Config::builder();
        if let Some(global) = Self::global_config_path() {
            builder = builder.add_source(File::from(global).required(false));
        }
        Self::finish(builder)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<DatashedConfig, CatalogError> {
        let builder = Config::builder().add_source(File::from(path.to_path_buf()));
        Self::finish(builder)
    }

    fn finish(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<DatashedConfig, CatalogError> {
        let config = builder
            .add_source(
                Environment::with_prefix("DATASHED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CatalogError::Config(e.to_string()))?;

        // An empty source set deserializes through the serde defaults.
        config
            .try_deserialize()
            .map_err(|e| CatalogError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_logging_defaults() {
        let config = DatashedConfig::default();
        assert!(config.logging.enabled);
        assert!(!config.base_path.as_os_str().is_empty());
    }

    #[test]
    fn load_from_file_reads_base_path() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("config.toml");
        std::fs::write(&file, "base_path = \"/tmp/sheds\"\n[logging]\nlevel = \"debug\"\n")
            .unwrap();
        let config = ConfigLoader::load_from_file(&file).unwrap();
        assert_eq!(config.base_path, PathBuf::from("/tmp/sheds"));
        assert_eq!(config.logging.level, "debug");
    }
}
