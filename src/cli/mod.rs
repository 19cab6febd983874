// src/cli/mod.rs
//! CLI definitions for ledgersync
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! - `init` - Create target tables for every mapping
//! - `run` - Full pipeline (load, compare, recommend, execute, verify)
//! - `diff` - Dry run that prints what would change
//! - `verify` - Recount source and target
//! - `generations` - List extract generations
//! - `mappings` - Inspect the mapping registry

use clap::{Args, Parser, Subcommand};
use ledgersync::ConflictPolicy;
use std::path::PathBuf;

mod mappings;

pub use mappings::MappingsCommands;

#[derive(Parser)]
#[command(name = "ledgersync")]
#[command(version)]
#[command(about = "Keep a relational store in sync with timestamped accounting extracts", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: ./ledgersync.toml if present)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the target database
    #[arg(short, long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Directory holding generation subdirectories
    #[arg(short, long, global = true, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Mapping registry file (default: builtin mappings)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub mappings: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the target database and any missing entity tables
    Init,

    /// Reconcile the target store with a generation
    Run {
        /// Stop after recommendations; write nothing
        #[arg(long)]
        dry_run: bool,

        /// Conflict policy: source_wins, target_wins or manual
        #[arg(short, long, value_name = "POLICY")]
        policy: Option<ConflictPolicy>,

        /// Generation to reconcile (default: newest)
        #[arg(short, long)]
        generation: Option<String>,

        /// Entity to process (repeatable; default: all)
        #[arg(short, long = "entity", value_name = "ENTITY")]
        entities: Vec<String>,

        /// Write the run report as JSON
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Show what a run would change without writing
    Diff {
        /// Generation to compare (default: newest)
        #[arg(short, long)]
        generation: Option<String>,

        /// Entity to compare (repeatable; default: all)
        #[arg(short, long = "entity", value_name = "ENTITY")]
        entities: Vec<String>,

        /// List affected keys and differing columns
        #[arg(short, long)]
        keys: bool,
    },

    /// Compare source and target record counts
    Verify {
        /// Generation to count (default: newest)
        #[arg(short, long)]
        generation: Option<String>,

        /// Entity to count (repeatable; default: all)
        #[arg(short, long = "entity", value_name = "ENTITY")]
        entities: Vec<String>,
    },

    /// List extract generations, newest first
    Generations,

    /// Inspect the mapping registry
    #[command(subcommand)]
    Mappings(MappingsCommands),
}
