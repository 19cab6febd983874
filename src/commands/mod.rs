// src/commands/mod.rs
//! Command handlers for the ledgersync CLI

mod generations;
mod init;
mod mappings;
pub mod progress;
mod run;
mod verify;

pub use generations::cmd_generations;
pub use init::cmd_init;
pub use mappings::{cmd_mappings_list, cmd_mappings_show};
pub use run::{cmd_diff, cmd_run};
pub use verify::cmd_verify;

use anyhow::{Context, Result};
use ledgersync::{ConflictPolicy, FsRecordSource, LedgerConfig, MappingRegistry};
use std::path::PathBuf;

use crate::cli::GlobalArgs;

/// Effective settings: flags over config file over defaults
pub struct Settings {
    pub db_path: PathBuf,
    pub source_dir: PathBuf,
    pub registry: MappingRegistry,
    pub conflict_policy: ConflictPolicy,
    pub entities: Vec<String>,
    pub quiet: bool,
}

impl Settings {
    pub fn resolve(global: &GlobalArgs) -> Result<Self> {
        let config = LedgerConfig::discover(global.config.as_deref())
            .context("Failed to load configuration")?;
        let sync = config.sync.clone();

        let registry = match &global.mappings {
            Some(path) => MappingRegistry::load_file(path)
                .with_context(|| format!("Failed to load mappings from {}", path.display()))?,
            None => config.registry().context("Failed to load mapping registry")?,
        };

        Ok(Self {
            db_path: global.db_path.clone().unwrap_or(sync.db_path),
            source_dir: global.source_dir.clone().unwrap_or(sync.source_dir),
            registry,
            conflict_policy: sync.conflict_policy,
            entities: sync.entities,
            quiet: global.quiet,
        })
    }

    /// Entities from the command line, else from the config file
    pub fn entities_or(&self, requested: Vec<String>) -> Vec<String> {
        if requested.is_empty() {
            self.entities.clone()
        } else {
            requested
        }
    }

    pub fn source(&self) -> FsRecordSource {
        FsRecordSource::new(&self.source_dir)
    }
}
