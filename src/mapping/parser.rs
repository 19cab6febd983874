// src/mapping/parser.rs

//! Parser for mapping registry TOML files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{EntityMapping, FieldMapping, MappingRegistry};
use crate::error::{Error, Result};

/// On-disk registry layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntitySection>,
}

/// One `[[entity]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySection {
    pub name: String,

    /// Target table, defaults to the entity name
    #[serde(default)]
    pub table: Option<String>,

    pub source_key: String,

    pub target_key: String,

    /// Ordered `[[entity.field]]` tables
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSection {
    pub source: String,

    /// Target column, defaults to the source field name
    #[serde(default)]
    pub target: Option<String>,
}

impl From<EntitySection> for EntityMapping {
    fn from(section: EntitySection) -> Self {
        let table = section.table.unwrap_or_else(|| section.name.clone());
        let fields = section
            .fields
            .into_iter()
            .map(|f| {
                let target = f.target.unwrap_or_else(|| f.source.clone());
                FieldMapping::new(f.source, target)
            })
            .collect();
        EntityMapping::new(section.name, table, section.source_key, section.target_key, fields)
    }
}

/// Parse a mapping registry from a TOML file
pub fn parse_registry_file(path: &Path) -> Result<MappingRegistry> {
    let content = std::fs::read_to_string(path)?;
    parse_registry_string(&content)
}

/// Parse a mapping registry from a TOML string
pub fn parse_registry_string(content: &str) -> Result<MappingRegistry> {
    let file: RegistryFile = toml::from_str(content)?;
    if file.entities.is_empty() {
        return Err(Error::InvalidMapping(
            "registry declares no entities".to_string(),
        ));
    }
    MappingRegistry::new(file.entities.into_iter().map(EntityMapping::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const REGISTRY: &str = r#"
[[entity]]
name = "contacts"
table = "Contacts"
source_key = "id"
target_key = "ID"

[[entity.field]]
source = "id"
target = "ID"

[[entity.field]]
source = "name"
target = "Name"

[[entity.field]]
source = "email"

[[entity]]
name = "items"
source_key = "item_id"
target_key = "item_id"

[[entity.field]]
source = "item_id"
"#;

    #[test]
    fn test_parse_registry_string() {
        let registry = parse_registry_string(REGISTRY).unwrap();
        assert_eq!(registry.entity_names(), vec!["contacts", "items"]);

        let contacts = registry.get_mapping("contacts").unwrap();
        assert_eq!(contacts.target_table, "Contacts");
        assert_eq!(
            contacts.target_columns().collect::<Vec<_>>(),
            vec!["ID", "Name", "email"]
        );

        let items = registry.get_mapping("items").unwrap();
        assert_eq!(items.target_table, "items");
    }

    #[test]
    fn test_parse_registry_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", REGISTRY).unwrap();

        let registry = parse_registry_file(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert!(matches!(
            parse_registry_string(""),
            Err(Error::InvalidMapping(_))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            parse_registry_string("[[entity]]\nname = 3"),
            Err(Error::Toml(_))
        ));
    }
}
