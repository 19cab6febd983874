// src/config.rs
//! Configuration file parsing for ledgersync
//!
//! An optional TOML file with a single `[sync]` section:
//!
//! ```toml
//! [sync]
//! db_path = "ledger.db"
//! source_dir = "exports"
//! mappings = "mappings.toml"
//! conflict_policy = "source_wins"
//! entities = ["invoices", "items"]
//! ```
//!
//! Command-line flags override these values, and these values override the
//! built-in defaults. Relative paths are taken as given, relative to the
//! working directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::mapping::MappingRegistry;
use crate::sync::ConflictPolicy;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "ledgersync.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default)]
    pub sync: SyncSection,
}

/// `[sync]` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSection {
    /// Target SQLite database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory holding generation subdirectories
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Mapping registry file; builtin registry when absent
    #[serde(default)]
    pub mappings: Option<PathBuf>,

    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Entities to process; all registered entities when empty
    #[serde(default)]
    pub entities: Vec<String>,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            source_dir: default_source_dir(),
            mappings: None,
            conflict_policy: ConflictPolicy::default(),
            entities: Vec::new(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ledger.db")
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("exports")
}

impl LedgerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content).map_err(|e| Error::ParseError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LedgerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` (which must exist), else the default file if present,
    /// else built-in defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            debug!("Using config file {}", default_path.display());
            Self::load(default_path)
        } else {
            debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.sync.db_path.as_os_str().is_empty() {
            return Err(Error::ConfigError("sync.db_path must not be empty".to_string()));
        }
        if self.sync.source_dir.as_os_str().is_empty() {
            return Err(Error::ConfigError(
                "sync.source_dir must not be empty".to_string(),
            ));
        }
        if let Some(blank) = self.sync.entities.iter().find(|e| e.trim().is_empty()) {
            return Err(Error::ConfigError(format!(
                "sync.entities contains a blank name: {blank:?}"
            )));
        }
        Ok(())
    }

    /// The mapping registry this configuration selects
    pub fn registry(&self) -> Result<MappingRegistry> {
        match &self.sync.mappings {
            Some(path) => MappingRegistry::load_file(path),
            None => Ok(MappingRegistry::builtin()),
        }
    }
}
