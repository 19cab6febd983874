// src/cli/mappings.rs
//! Mapping registry inspection commands

use clap::Subcommand;

#[derive(Subcommand)]
pub enum MappingsCommands {
    /// List registered entities and their target tables
    List,

    /// Show the field map of one entity
    Show {
        /// Entity name
        entity: String,
    },
}
