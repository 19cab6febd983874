// src/source/mod.rs

//! Record Source - timestamped generations of extracted records
//!
//! A generation is one batch of extracts for all entities, identified by the
//! `YYYY-MM-DD_HH-MM-SS` timestamp it was taken at. Identifiers sort
//! lexicographically in time order, so the newest generation is simply the
//! greatest one.
//!
//! The comparator and orchestrator only see the `RecordSource` trait; the
//! filesystem layout is one implementation of it.

mod fs;
mod memory;

pub use fs::FsRecordSource;
pub use memory::MemoryRecordSource;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};
use crate::record::Record;

/// Timestamp layout of generation identifiers
pub const GENERATION_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Identifier of one extract generation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Generation(String);

impl Generation {
    /// Parse a generation identifier, rejecting names that are not timestamps
    pub fn parse(name: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(name, GENERATION_FORMAT)
            .ok()
            .map(|_| Self(name.to_string()))
    }

    /// When this generation was extracted
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.0, GENERATION_FORMAT).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Records loaded for one entity from one generation
#[derive(Debug, Clone)]
pub struct LoadedEntity {
    pub entity_name: String,
    pub generation: Generation,
    pub records: Vec<Record>,
    /// Non-fatal problems met while loading
    pub warnings: Vec<String>,
}

impl LoadedEntity {
    /// An entity with no records, e.g. because its file is absent
    pub fn empty(entity_name: &str, generation: Generation, warning: String) -> Self {
        Self {
            entity_name: entity_name.to_string(),
            generation,
            records: Vec::new(),
            warnings: vec![warning],
        }
    }
}

/// Producer of extracted records
pub trait RecordSource {
    /// Generation identifiers, newest first
    fn list_generations(&self) -> Result<Vec<Generation>>;

    /// Load all records of an entity from a generation (newest if `None`)
    fn load(&self, entity_name: &str, generation: Option<&Generation>) -> Result<LoadedEntity>;

    /// Human-readable location, used in error messages
    fn describe(&self) -> String;

    /// Pick the requested generation, or the newest one
    fn resolve_generation(&self, requested: Option<&str>) -> Result<Generation> {
        let generations = self.list_generations()?;
        match requested {
            Some(name) => generations
                .into_iter()
                .find(|g| g.as_str() == name)
                .ok_or_else(|| Error::GenerationNotFound(name.to_string())),
            None => generations
                .into_iter()
                .next()
                .ok_or_else(|| Error::NoGenerationsAvailable(self.describe())),
        }
    }
}

/// Flatten the supported payload shapes into a list of records
///
/// Accepted shapes: a bare array, `{entity: [...]}` (key matched
/// case-insensitively), `{"data": [...]}` and a single object.
pub fn extract_records(entity_name: &str, payload: Value) -> (Vec<Record>, Vec<String>) {
    let mut warnings = Vec::new();

    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut object) => {
            let wrapper = object
                .keys()
                .find(|k| k.eq_ignore_ascii_case(entity_name) && object[*k].is_array())
                .cloned()
                .or_else(|| {
                    object
                        .get("data")
                        .filter(|v| v.is_array())
                        .map(|_| "data".to_string())
                });

            match wrapper.and_then(|key| object.remove(&key)) {
                Some(Value::Array(items)) => items,
                _ if object.is_empty() => {
                    warnings.push(format!("{entity_name}: payload is an empty object"));
                    Vec::new()
                }
                _ => vec![Value::Object(object)],
            }
        }
        other => {
            warnings.push(format!(
                "{entity_name}: unsupported payload of type {}",
                json_type(&other)
            ));
            Vec::new()
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let kind = json_type(&item);
        match Record::from_value(item) {
            Some(record) => records.push(record),
            None => warnings.push(format!(
                "{entity_name}: element #{index} is a {kind}, not an object; skipped"
            )),
        }
    }

    (records, warnings)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
