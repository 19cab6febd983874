// src/mapping/mod.rs

//! Mapping Registry - per-entity projection metadata
//!
//! Each entity declares the table it lands in, the primary-key pair that
//! identifies a record on both sides, and an ordered source -> target field
//! map. The registry is built once at startup and handed to the comparator,
//! executor and orchestrator; nothing mutates it afterwards.
//!
//! # Example mappings.toml
//!
//! ```toml
//! [[entity]]
//! name = "contacts"
//! table = "Contacts"
//! source_key = "contact_id"
//! target_key = "ContactID"
//!
//! [[entity.field]]
//! source = "contact_id"
//! target = "ContactID"
//!
//! [[entity.field]]
//! source = "contact_name"
//! target = "ContactName"
//! ```

mod builtin;
pub mod parser;

pub use parser::{parse_registry_file, parse_registry_string};

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};
use crate::record::Record;

/// One source field projected onto one target column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    pub source: String,
    pub target: String,
}

impl FieldMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Declarative metadata for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMapping {
    pub entity_name: String,
    pub target_table: String,
    pub source_primary_key: String,
    pub target_primary_key: String,
    /// Ordered source field -> target column projection
    pub field_map: Vec<FieldMapping>,
}

impl EntityMapping {
    /// Create a mapping. Call `validate` (or build through the registry) before use.
    pub fn new(
        entity_name: impl Into<String>,
        target_table: impl Into<String>,
        source_primary_key: impl Into<String>,
        target_primary_key: impl Into<String>,
        field_map: Vec<FieldMapping>,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            target_table: target_table.into(),
            source_primary_key: source_primary_key.into(),
            target_primary_key: target_primary_key.into(),
            field_map,
        }
    }

    /// Project a source record onto target columns, in field-map order.
    /// Fields absent from the record project as null.
    pub fn project(&self, record: &Record) -> Vec<(&str, Value)> {
        self.field_map
            .iter()
            .map(|f| (f.target.as_str(), record.get_or_null(&f.source).clone()))
            .collect()
    }

    /// Target columns in field-map order
    pub fn target_columns(&self) -> impl Iterator<Item = &str> {
        self.field_map.iter().map(|f| f.target.as_str())
    }

    /// Target columns other than the primary key
    pub fn non_key_columns(&self) -> impl Iterator<Item = &str> {
        self.target_columns()
            .filter(move |c| *c != self.target_primary_key)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        let name = &self.entity_name;
        if name.trim().is_empty() {
            return Err(Error::InvalidMapping("entity name is empty".to_string()));
        }
        if self.target_table.trim().is_empty() {
            return Err(Error::InvalidMapping(format!("{name}: target table is empty")));
        }
        if self.field_map.is_empty() {
            return Err(Error::InvalidMapping(format!("{name}: field map is empty")));
        }

        let mut targets = HashSet::new();
        let mut sources = HashSet::new();
        for field in &self.field_map {
            if field.source.is_empty() || field.target.is_empty() {
                return Err(Error::InvalidMapping(format!(
                    "{name}: field mappings must name both a source and a target"
                )));
            }
            if !sources.insert(field.source.as_str()) {
                return Err(Error::InvalidMapping(format!(
                    "{name}: source field '{}' mapped twice",
                    field.source
                )));
            }
            if !targets.insert(field.target.as_str()) {
                return Err(Error::InvalidMapping(format!(
                    "{name}: target column '{}' mapped twice",
                    field.target
                )));
            }
        }

        let key_mapped = self.field_map.iter().any(|f| {
            f.source == self.source_primary_key && f.target == self.target_primary_key
        });
        if !key_mapped {
            return Err(Error::InvalidMapping(format!(
                "{name}: primary key '{}' must map to '{}'",
                self.source_primary_key, self.target_primary_key
            )));
        }

        Ok(())
    }
}

/// Immutable entity name -> mapping lookup
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: BTreeMap<String, EntityMapping>,
}

impl MappingRegistry {
    /// Build a registry, validating every mapping
    pub fn new(mappings: Vec<EntityMapping>) -> Result<Self> {
        let mut registry = BTreeMap::new();
        for mapping in mappings {
            mapping.validate()?;
            let name = mapping.entity_name.clone();
            if registry.insert(name.clone(), mapping).is_some() {
                return Err(Error::InvalidMapping(format!(
                    "entity '{name}' declared more than once"
                )));
            }
        }
        Ok(Self { mappings: registry })
    }

    /// The registry shipped with ledgersync
    pub fn builtin() -> Self {
        Self {
            mappings: builtin::mappings()
                .into_iter()
                .map(|m| (m.entity_name.clone(), m))
                .collect(),
        }
    }

    /// Look up the mapping for an entity
    pub fn get_mapping(&self, entity_name: &str) -> Result<&EntityMapping> {
        self.mappings
            .get(entity_name)
            .ok_or_else(|| Error::MappingNotFound(entity_name.to_string()))
    }

    /// Registered entity names, sorted
    pub fn entity_names(&self) -> Vec<&str> {
        self.mappings.keys().map(|s| s.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityMapping> {
        self.mappings.values()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Parse a registry from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_registry_string(content)
    }

    /// Load a registry from a TOML file
    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        parse_registry_file(path.as_ref())
    }
}
