// src/error.rs

//! Error types for ledgersync
//!
//! `Error` covers failures that escape a function: run-fatal conditions
//! (no generation to reconcile) and entity-scoped ones (unknown mapping,
//! missing target table). Per-record problems live in `RecordError` and are
//! accumulated into results instead of being propagated.

use serde::Serialize;
use thiserror::Error;

/// Library error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("No generations available under {0}")]
    NoGenerationsAvailable(String),

    #[error("Generation not found: {0}")]
    GenerationNotFound(String),

    #[error("No mapping registered for entity '{0}'")]
    MappingNotFound(String),

    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("Target table '{0}' does not exist")]
    TargetTableMissing(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error aborts the whole run rather than one entity
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Error::NoGenerationsAvailable(_) | Error::GenerationNotFound(_)
        )
    }
}

/// Result type for ledgersync operations
pub type Result<T> = std::result::Result<T, Error>;

/// A problem with a single record. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordError {
    #[error("{entity}: record #{index} has no value for primary key '{field}'")]
    MissingPrimaryKey {
        entity: String,
        index: usize,
        field: String,
    },

    #[error("{entity}: duplicate primary key '{key}' in source, later record kept")]
    DuplicatePrimaryKey { entity: String, key: String },

    #[error("{entity}: no source record for key '{key}'")]
    SourceRecordMissing { entity: String, key: String },

    #[error("{entity}: write failed for key '{key}': {reason}")]
    WriteFailure {
        entity: String,
        key: String,
        reason: String,
    },

    #[error("{entity}: update for key '{key}' affected no rows")]
    NoRowsAffected { entity: String, key: String },
}
