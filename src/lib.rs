// src/lib.rs

//! ledgersync - differential synchronization of accounting extracts
//!
//! Keeps a SQLite datastore in agreement with timestamped extracts of
//! business records (invoices, bills, items, contacts, payments, orders).
//!
//! # Architecture
//!
//! - Mapping registry: immutable per-entity table, key and field metadata
//! - Record source: generations of extracted records behind a trait
//! - Sync engine: compare, recommend, execute under a conflict policy, verify
//! - Target store: one table per entity, rows are never deleted

pub mod config;
pub mod db;
mod error;
pub mod mapping;
pub mod progress;
pub mod record;
pub mod source;
pub mod sync;

pub use config::LedgerConfig;
pub use error::{Error, RecordError, Result};
pub use mapping::{EntityMapping, FieldMapping, MappingRegistry};
pub use progress::{LogProgress, ProgressTracker, SilentProgress};
pub use record::Record;
pub use source::{FsRecordSource, Generation, LoadedEntity, MemoryRecordSource, RecordSource};
pub use sync::{
    ConflictPolicy, EntityStatus, Orchestrator, RunReport, Stage, SyncAction, SyncOptions,
    SyncRecommendation, SyncStatus, VerificationReport,
};
